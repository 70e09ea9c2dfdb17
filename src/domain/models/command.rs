use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::models::{
    booking::Booking,
    event::{Event, EventOption},
    vote::{SlotTally, Vote, VoteChoice},
};
use crate::error::AppError;

pub const MAX_CANDIDATE_SLOTS: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEventRequest {
    pub title: String,
    pub project: Option<String>,
    pub room_id: Option<String>,
    pub location: Option<String>,
    pub meeting_url: Option<String>,
    #[serde(default)]
    pub required_attendees: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub slots: Vec<CandidateSlot>,
    pub created_by: String,
    pub vote_reminder_minutes: Option<i32>,
    pub join_reminder_minutes: Option<i32>,
}

impl NewEventRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be empty".into()));
        }
        if self.created_by.trim().is_empty() {
            return Err(AppError::Validation("Creator must be set".into()));
        }
        if self.slots.is_empty() || self.slots.len() > MAX_CANDIDATE_SLOTS {
            return Err(AppError::Validation(format!(
                "Between 1 and {} candidate slots are required", MAX_CANDIDATE_SLOTS
            )));
        }
        if let Some(slot) = self.slots.iter().find(|s| s.end <= s.start) {
            return Err(AppError::Validation(format!(
                "Candidate slot {} must end after it starts", slot.start.to_rfc3339()
            )));
        }
        if self.vote_reminder_minutes.is_some_and(|m| m < 0)
            || self.join_reminder_minutes.is_some_and(|m| m < 0) {
            return Err(AppError::Validation("Reminder lead times must not be negative".into()));
        }
        Ok(())
    }

    /// Candidate slots with exact duplicates collapsed, earliest first.
    pub fn distinct_slots(&self) -> Vec<CandidateSlot> {
        let mut slots = self.slots.clone();
        slots.sort_by_key(|s| (s.start, s.end));
        slots.dedup();
        slots
    }

    pub fn distinct_attendees(&self) -> Vec<String> {
        let mut users: Vec<String> = self.required_attendees.iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        users.sort();
        users.dedup();
        users
    }
}

/// Inbound interactions from the chat platform, validated before they reach the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    NewEventRequested(NewEventRequest),
    VoteCast {
        option_id: String,
        voter_id: String,
        choice: VoteChoice,
    },
    StatusRequested {
        event_id: String,
    },
    CloseRequested {
        event_id: String,
        requester_id: String,
    },
    CancelRequested {
        event_id: String,
        requester_id: String,
    },
}

impl Command {
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            Command::NewEventRequested(req) => req.validate(),
            Command::VoteCast { option_id, voter_id, .. } => {
                require_id("option_id", option_id)?;
                require_id("voter_id", voter_id)
            }
            Command::StatusRequested { event_id } => require_id("event_id", event_id),
            Command::CloseRequested { event_id, requester_id }
            | Command::CancelRequested { event_id, requester_id } => {
                require_id("event_id", event_id)?;
                require_id("requester_id", requester_id)
            }
        }
    }
}

fn require_id(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct EventStatusView {
    pub event: Event,
    pub options: Vec<SlotTally>,
    pub booking: Option<Booking>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandReply {
    EventCreated {
        event: Event,
        options: Vec<EventOption>,
    },
    VoteRecorded {
        vote: Vote,
    },
    Status(EventStatusView),
    Decided {
        event_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attendees: Vec<String>,
    },
    NothingToDecide {
        event_id: String,
    },
    AlreadyDecided {
        event_id: String,
    },
    Cancelled {
        event_id: String,
        released: Option<CandidateSlot>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn request(slots: Vec<CandidateSlot>) -> NewEventRequest {
        NewEventRequest {
            title: "Sprint review".into(),
            project: None,
            room_id: None,
            location: None,
            meeting_url: None,
            required_attendees: vec!["U2".into(), "U1".into(), "U2".into(), " ".into()],
            deadline: Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap(),
            slots,
            created_by: "U1".into(),
            vote_reminder_minutes: None,
            join_reminder_minutes: None,
        }
    }

    fn slot(hour: u32) -> CandidateSlot {
        let start = Utc.with_ymd_and_hms(2030, 1, 2, hour, 0, 0).unwrap();
        CandidateSlot { start, end: start + Duration::hours(1) }
    }

    #[test]
    fn test_slot_count_bounds() {
        assert!(request(vec![]).validate().is_err());
        assert!(request((0..9).map(|h| slot(h + 8)).collect()).validate().is_err());
        assert!(request((0..8).map(|h| slot(h + 8)).collect()).validate().is_ok());
    }

    #[test]
    fn test_slot_must_end_after_start() {
        let start = Utc.with_ymd_and_hms(2030, 1, 2, 10, 0, 0).unwrap();
        let req = request(vec![CandidateSlot { start, end: start }]);
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_duplicates_collapse() {
        let req = request(vec![slot(14), slot(10), slot(14)]);
        assert_eq!(req.distinct_slots(), vec![slot(10), slot(14)]);
        assert_eq!(req.distinct_attendees(), vec!["U1".to_string(), "U2".to_string()]);
    }

    #[test]
    fn test_command_is_tagged() {
        let cmd: Command = serde_json::from_value(json!({
            "type": "vote_cast",
            "option_id": "opt-1",
            "voter_id": "U1",
            "choice": "maybe"
        })).unwrap();
        assert!(matches!(cmd, Command::VoteCast { choice: VoteChoice::Maybe, .. }));

        let bad = serde_json::from_value::<Command>(json!({
            "type": "vote_cast", "option_id": "opt-1", "voter_id": "U1", "choice": "perhaps"
        }));
        assert!(bad.is_err());

        let empty: Command = serde_json::from_value(json!({
            "type": "close_requested", "event_id": "", "requester_id": "U1"
        })).unwrap();
        assert!(empty.validate().is_err());
    }
}
