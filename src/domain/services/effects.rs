//! Advisory side effects (chat notices, calendar sync).
//!
//! Their failures are logged and recorded on the primary result but never
//! turn it into an error.

use serde::Serialize;
use std::future::Future;
use tracing::{debug, warn};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    VoteMessagePublish,
    VoteMessageRefresh,
    DecisionNotice,
    CancellationNotice,
    CalendarRegister,
    CalendarCancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum EffectOutcome {
    Done,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectReport {
    pub kind: EffectKind,
    pub outcome: EffectOutcome,
}

impl EffectReport {
    pub fn skipped(kind: EffectKind) -> Self {
        Self { kind, outcome: EffectOutcome::Skipped }
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, EffectOutcome::Failed(_))
    }
}

/// Runs an advisory effect to completion, swallowing its error.
pub async fn fire_and_forget<F>(kind: EffectKind, event_id: &str, effect: F) -> EffectReport
where
    F: Future<Output = Result<EffectOutcome, AppError>>,
{
    let outcome = match effect.await {
        Ok(outcome) => {
            debug!(?kind, event_id, ?outcome, "advisory effect finished");
            outcome
        }
        Err(e) => {
            warn!(?kind, event_id, error = %e, "advisory effect failed, continuing");
            EffectOutcome::Failed(e.to_string())
        }
    };
    EffectReport { kind, outcome }
}
