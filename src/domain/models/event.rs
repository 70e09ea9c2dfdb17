use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Planning,
    Closed,
    Fixed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Planning => "planning",
            EventStatus::Closed => "closed",
            EventStatus::Fixed => "fixed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for EventStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "planning" => Ok(EventStatus::Planning),
            "closed" => Ok(EventStatus::Closed),
            "fixed" => Ok(EventStatus::Fixed),
            other => Err(format!("unknown event status '{}'", other)),
        }
    }
}

/// Channel + timestamp of the chat message an event was announced with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub project: Option<String>,
    pub room_id: Option<String>,
    pub location: Option<String>,
    pub meeting_url: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub deadline: DateTime<Utc>,
    pub created_by: String,
    pub vote_reminder_minutes: Option<i32>,
    pub join_reminder_minutes: Option<i32>,
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewEventParams {
    pub title: String,
    pub project: Option<String>,
    pub room_id: Option<String>,
    pub location: Option<String>,
    pub meeting_url: Option<String>,
    pub deadline: DateTime<Utc>,
    pub created_by: String,
    pub vote_reminder_minutes: Option<i32>,
    pub join_reminder_minutes: Option<i32>,
}

impl Event {
    pub fn new(params: NewEventParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: params.title,
            project: params.project,
            room_id: params.room_id,
            location: params.location,
            meeting_url: params.meeting_url,
            status: EventStatus::Planning,
            deadline: params.deadline,
            created_by: params.created_by,
            vote_reminder_minutes: params.vote_reminder_minutes,
            join_reminder_minutes: params.join_reminder_minutes,
            channel_id: None,
            message_ts: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn message_ref(&self) -> Option<MessageRef> {
        match (&self.channel_id, &self.message_ts) {
            (Some(channel), Some(ts)) => Some(MessageRef { channel: channel.clone(), ts: ts.clone() }),
            _ => None,
        }
    }
}

/// A candidate time slot of an event.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
pub struct EventOption {
    pub id: String,
    pub event_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl EventOption {
    pub fn new(event_id: String, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            start_time,
            end_time,
        }
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        !(end <= self.start_time || start >= self.end_time)
    }
}
