use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Yes,
    No,
    Maybe,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Yes => "yes",
            VoteChoice::No => "no",
            VoteChoice::Maybe => "maybe",
        }
    }
}

impl TryFrom<String> for VoteChoice {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "yes" => Ok(VoteChoice::Yes),
            "no" => Ok(VoteChoice::No),
            "maybe" => Ok(VoteChoice::Maybe),
            other => Err(format!("unknown vote choice '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Vote {
    pub id: String,
    pub option_id: String,
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub choice: VoteChoice,
    pub voted_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(option_id: String, user_id: String, choice: VoteChoice) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            option_id,
            user_id,
            choice,
            voted_at: Utc::now(),
        }
    }
}

/// Vote counts of one candidate slot.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
pub struct SlotTally {
    pub option_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub yes_count: i64,
    pub maybe_count: i64,
    pub no_count: i64,
}
