use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub event_id: String,
    pub room_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Written once when the external calendar entry is known.
    pub external_calendar_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(event_id: String, room_id: Option<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            room_id,
            start_time: start,
            end_time: end,
            external_calendar_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A booking of another event in the same room, with the head counts needed
/// to estimate how many people occupy it.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct OverlappingBooking {
    pub booking_id: String,
    pub event_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendance_count: i64,
    pub required_count: i64,
}

impl OverlappingBooking {
    /// Attendance log entries once the event is decided, required attendees before.
    pub fn headcount(&self) -> i64 {
        if self.attendance_count > 0 {
            self.attendance_count
        } else {
            self.required_count
        }
    }
}

/// Row of the confirmed-bookings feed.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ConfirmedBooking {
    pub booking_id: String,
    pub title: String,
    pub location: Option<String>,
    pub meeting_url: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fixed event joined to its booking, as seen by the join-reminder scan.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct UpcomingMeeting {
    pub event_id: String,
    pub title: String,
    pub location: Option<String>,
    pub meeting_url: Option<String>,
    pub room_name: Option<String>,
    pub join_reminder_minutes: Option<i32>,
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    Booking,
    Candidate,
}

impl TryFrom<String> for ScheduleKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "booking" => Ok(ScheduleKind::Booking),
            "candidate" => Ok(ScheduleKind::Candidate),
            other => Err(format!("unknown schedule kind '{}'", other)),
        }
    }
}

/// A room occupation, either a realized booking or a still-open candidate slot.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ScheduleRow {
    #[sqlx(try_from = "String")]
    pub kind: ScheduleKind,
    pub event_id: String,
    pub room_id: String,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
