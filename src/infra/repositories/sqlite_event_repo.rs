use crate::domain::models::{
    attendance::AttendanceEntry,
    booking::{Booking, ScheduleRow},
    event::{Event, EventOption, EventStatus, MessageRef},
};
use crate::domain::ports::{EventRepository, Transition};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Update-where-status-equals. Returns whether this caller performed the transition.
async fn transition_status(conn: &mut SqliteConnection, event_id: &str, expected: EventStatus, new: EventStatus) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE events SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(new.as_str()).bind(Utc::now()).bind(event_id).bind(expected.as_str())
        .execute(conn).await.map_err(AppError::Database)?;
    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event, options: &[EventOption], attendees: &[String]) -> Result<Event, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Event>(
            "INSERT INTO events (id, title, project, room_id, location, meeting_url, status, deadline, created_by,
                                 vote_reminder_minutes, join_reminder_minutes, channel_id, message_ts, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&event.id).bind(&event.title).bind(&event.project).bind(&event.room_id)
            .bind(&event.location).bind(&event.meeting_url).bind(event.status.as_str()).bind(event.deadline)
            .bind(&event.created_by).bind(event.vote_reminder_minutes).bind(event.join_reminder_minutes)
            .bind(&event.channel_id).bind(&event.message_ts).bind(event.created_at).bind(event.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for option in options {
            sqlx::query(
                "INSERT INTO event_options (id, event_id, start_time, end_time) VALUES (?, ?, ?, ?)
                 ON CONFLICT (event_id, start_time, end_time) DO NOTHING"
            )
                .bind(&option.id).bind(&option.event_id).bind(option.start_time).bind(option.end_time)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        for user_id in attendees {
            sqlx::query("INSERT INTO required_attendees (event_id, user_id) VALUES (?, ?) ON CONFLICT DO NOTHING")
                .bind(&event.id).bind(user_id)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_options(&self, event_id: &str) -> Result<Vec<EventOption>, AppError> {
        sqlx::query_as::<_, EventOption>("SELECT * FROM event_options WHERE event_id = ? ORDER BY start_time ASC, end_time ASC")
            .bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_option(&self, option_id: &str) -> Result<Option<EventOption>, AppError> {
        sqlx::query_as::<_, EventOption>("SELECT * FROM event_options WHERE id = ?").bind(option_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_message_ref(&self, event_id: &str, message: &MessageRef) -> Result<(), AppError> {
        sqlx::query("UPDATE events SET channel_id = ?, message_ts = ?, updated_at = ? WHERE id = ?")
            .bind(&message.channel).bind(&message.ts).bind(Utc::now()).bind(event_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn commit_decision(&self, event_id: &str, attendance: &[AttendanceEntry], booking: &Booking) -> Result<Transition<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        if !transition_status(&mut *tx, event_id, EventStatus::Planning, EventStatus::Fixed).await? {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(Transition::Lost);
        }

        for entry in attendance {
            sqlx::query(
                "INSERT INTO attendance_logs (id, event_id, user_id, option_id, start_time, end_time, recorded_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (event_id, user_id) DO NOTHING"
            )
                .bind(&entry.id).bind(&entry.event_id).bind(&entry.user_id).bind(&entry.option_id)
                .bind(entry.start_time).bind(entry.end_time).bind(entry.recorded_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        sqlx::query(
            "INSERT INTO bookings (id, event_id, room_id, start_time, end_time, external_calendar_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (event_id) DO NOTHING"
        )
            .bind(&booking.id).bind(&booking.event_id).bind(&booking.room_id)
            .bind(booking.start_time).bind(booking.end_time).bind(&booking.external_calendar_id)
            .bind(booking.created_at).bind(booking.updated_at)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        let stored = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE event_id = ?")
            .bind(event_id).fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Transition::Applied(stored))
    }

    async fn close_event(&self, event_id: &str, expected: EventStatus) -> Result<Transition<Option<Booking>>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        if !transition_status(&mut *tx, event_id, expected, EventStatus::Closed).await? {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(Transition::Lost);
        }

        let released = sqlx::query_as::<_, Booking>("DELETE FROM bookings WHERE event_id = ? RETURNING *")
            .bind(event_id).fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Transition::Applied(released))
    }

    async fn list_due_for_decision(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE status = 'planning' AND deadline <= ? ORDER BY deadline ASC LIMIT ?"
        )
            .bind(now).bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_planning(&self) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE status = 'planning' ORDER BY deadline ASC")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_required_attendees(&self, event_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>("SELECT user_id FROM required_attendees WHERE event_id = ? ORDER BY user_id ASC")
            .bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_pending_voters(&self, event_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT r.user_id FROM required_attendees r
             WHERE r.event_id = ?
               AND NOT EXISTS (
                   SELECT 1 FROM votes v JOIN event_options o ON o.id = v.option_id
                   WHERE o.event_id = r.event_id AND v.user_id = r.user_id
               )
             ORDER BY r.user_id ASC"
        )
            .bind(event_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_candidate_slots_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScheduleRow>, AppError> {
        sqlx::query_as::<_, ScheduleRow>(
            "SELECT 'candidate' AS kind, e.id AS event_id, e.room_id AS room_id, e.title, o.start_time, o.end_time
             FROM event_options o JOIN events e ON e.id = o.event_id
             WHERE e.status = 'planning' AND e.room_id IS NOT NULL AND o.start_time < ? AND o.end_time > ?
             ORDER BY o.start_time ASC"
        )
            .bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
