use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use crate::domain::models::vote::SlotTally;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AttendanceEntry {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub option_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

impl AttendanceEntry {
    pub fn snapshot(event_id: &str, slot: &SlotTally, user_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: event_id.to_string(),
            user_id,
            option_id: slot.option_id.clone(),
            start_time: slot.start_time,
            end_time: slot.end_time,
            recorded_at: Utc::now(),
        }
    }
}
