use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Vote,
    Join,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::Vote => "vote",
            ReminderKind::Join => "join",
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ReminderKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "vote" => Ok(ReminderKind::Vote),
            "join" => Ok(ReminderKind::Join),
            other => Err(format!("unknown reminder kind '{}'", other)),
        }
    }
}

/// Ticket whose successful insertion authorizes exactly one reminder.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ReminderClaim {
    pub event_id: String,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub kind: ReminderKind,
    pub claimed_at: DateTime<Utc>,
}

impl ReminderClaim {
    pub fn new(event_id: &str, user_id: &str, kind: ReminderKind) -> Self {
        Self {
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
            kind,
            claimed_at: Utc::now(),
        }
    }
}
