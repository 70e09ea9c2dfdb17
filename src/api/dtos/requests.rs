use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub capacity: Option<i32>,
    pub calendar_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct ScheduleQuery {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}
