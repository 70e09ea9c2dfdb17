use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::services::availability::{RoomBusy, RoomSchedule};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub calendar_enabled: bool,
}

#[derive(Serialize)]
pub struct BusyResponse {
    pub now: DateTime<Utc>,
    pub timezone: String,
    pub rooms: Vec<RoomBusy>,
}

#[derive(Serialize)]
pub struct ScheduleResponse {
    pub timezone: String,
    pub rooms: Vec<RoomSchedule>,
}
