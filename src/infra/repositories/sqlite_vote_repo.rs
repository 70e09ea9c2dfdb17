use crate::domain::{models::vote::{SlotTally, Vote}, ports::VoteRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteVoteRepo {
    pool: SqlitePool,
}

impl SqliteVoteRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for SqliteVoteRepo {
    async fn upsert(&self, vote: &Vote) -> Result<Vote, AppError> {
        sqlx::query_as::<_, Vote>(
            "INSERT INTO votes (id, option_id, user_id, choice, voted_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (option_id, user_id) DO UPDATE SET choice = excluded.choice, voted_at = excluded.voted_at
             RETURNING *"
        )
            .bind(&vote.id).bind(&vote.option_id).bind(&vote.user_id).bind(vote.choice.as_str()).bind(vote.voted_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find(&self, option_id: &str, user_id: &str) -> Result<Option<Vote>, AppError> {
        sqlx::query_as::<_, Vote>("SELECT * FROM votes WHERE option_id = ? AND user_id = ?")
            .bind(option_id).bind(user_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn aggregate(&self, event_id: &str) -> Result<Vec<SlotTally>, AppError> {
        sqlx::query_as::<_, SlotTally>(
            "SELECT o.id AS option_id, o.start_time, o.end_time,
                    SUM(CASE WHEN v.choice = 'yes' THEN 1 ELSE 0 END) AS yes_count,
                    SUM(CASE WHEN v.choice = 'maybe' THEN 1 ELSE 0 END) AS maybe_count,
                    SUM(CASE WHEN v.choice = 'no' THEN 1 ELSE 0 END) AS no_count
             FROM event_options o LEFT JOIN votes v ON v.option_id = o.id
             WHERE o.event_id = ?
             GROUP BY o.id, o.start_time, o.end_time
             ORDER BY o.start_time ASC, o.end_time ASC"
        )
            .bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn count_yes(&self, option_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM votes WHERE option_id = ? AND choice = 'yes'")
            .bind(option_id).fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_yes_voters(&self, option_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>("SELECT user_id FROM votes WHERE option_id = ? AND choice = 'yes' ORDER BY user_id ASC")
            .bind(option_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
