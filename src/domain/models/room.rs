use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Room {
    pub id: String,
    pub name: String,
    /// `None` means unknown; any overlapping booking then counts as a conflict.
    pub capacity: Option<i32>,
    pub calendar_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(name: String, capacity: Option<i32>, calendar_ref: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            capacity,
            calendar_ref,
            created_at: Utc::now(),
        }
    }
}
