use crate::domain::{models::reminder::{ReminderClaim, ReminderKind}, ports::ReminderRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteReminderRepo {
    pool: SqlitePool,
}

impl SqliteReminderRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderRepository for SqliteReminderRepo {
    async fn claim(&self, event_id: &str, user_id: &str, kind: ReminderKind) -> Result<bool, AppError> {
        let claim = ReminderClaim::new(event_id, user_id, kind);
        let result = sqlx::query(
            "INSERT INTO reminder_claims (event_id, user_id, kind, claimed_at) VALUES (?, ?, ?, ?)
             ON CONFLICT (event_id, user_id, kind) DO NOTHING"
        )
            .bind(&claim.event_id).bind(&claim.user_id).bind(claim.kind.as_str()).bind(claim.claimed_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }
}
