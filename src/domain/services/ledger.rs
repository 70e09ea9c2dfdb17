use std::sync::Arc;
use tracing::info;
use crate::domain::models::vote::{SlotTally, Vote, VoteChoice};
use crate::domain::ports::{EventRepository, VoteRepository};
use crate::error::AppError;

/// One choice per (slot, voter), last write wins. Reads always hit the store.
pub struct VoteLedger {
    events: Arc<dyn EventRepository>,
    votes: Arc<dyn VoteRepository>,
}

impl VoteLedger {
    pub fn new(events: Arc<dyn EventRepository>, votes: Arc<dyn VoteRepository>) -> Self {
        Self { events, votes }
    }

    pub async fn cast_vote(&self, option_id: &str, voter_id: &str, choice: VoteChoice) -> Result<Vote, AppError> {
        self.events.find_option(option_id).await?
            .ok_or(AppError::NotFound(format!("Candidate slot {} not found", option_id)))?;

        let vote = self.votes.upsert(&Vote::new(option_id.to_string(), voter_id.to_string(), choice)).await?;
        info!("Vote recorded: {} -> {} on slot {}", voter_id, choice.as_str(), option_id);
        Ok(vote)
    }

    pub async fn aggregate(&self, event_id: &str) -> Result<Vec<SlotTally>, AppError> {
        self.votes.aggregate(event_id).await
    }
}
