use crate::domain::{models::attendance::AttendanceEntry, ports::AttendanceRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteAttendanceRepo {
    pool: SqlitePool,
}

impl SqliteAttendanceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for SqliteAttendanceRepo {
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<AttendanceEntry>, AppError> {
        sqlx::query_as::<_, AttendanceEntry>("SELECT * FROM attendance_logs WHERE event_id = ? ORDER BY user_id ASC")
            .bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
