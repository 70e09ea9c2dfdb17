use crate::domain::models::booking::{Booking, ConfirmedBooking, OverlappingBooking, ScheduleRow, UpcomingMeeting};
use crate::domain::ports::BookingRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{DateTime, Utc};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn find_by_event(&self, event_id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE event_id = ?").bind(event_id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn set_external_id(&self, booking_id: &str, external_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET external_calendar_id = ?, updated_at = ? WHERE id = ? AND external_calendar_id IS NULL"
        )
            .bind(external_id).bind(Utc::now()).bind(booking_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_overlapping(&self, room_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, excluding_event_id: Option<&str>) -> Result<Vec<OverlappingBooking>, AppError> {
        sqlx::query_as::<_, OverlappingBooking>(
            "SELECT b.id AS booking_id, b.event_id, b.start_time, b.end_time,
                    (SELECT COUNT(*) FROM attendance_logs a WHERE a.event_id = b.event_id) AS attendance_count,
                    (SELECT COUNT(*) FROM required_attendees r WHERE r.event_id = b.event_id) AS required_count
             FROM bookings b
             JOIN events e ON e.id = b.event_id
             WHERE e.status = 'fixed'
               AND b.room_id = ?
               AND NOT (? <= b.start_time OR ? >= b.end_time)
               AND (? IS NULL OR b.event_id != ?)
             ORDER BY b.start_time ASC"
        )
            .bind(room_id).bind(end).bind(start).bind(excluding_event_id).bind(excluding_event_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_confirmed(&self) -> Result<Vec<ConfirmedBooking>, AppError> {
        sqlx::query_as::<_, ConfirmedBooking>(
            "SELECT b.id AS booking_id, e.title, COALESCE(e.location, r.name) AS location, e.meeting_url,
                    b.start_time, b.end_time, b.updated_at
             FROM bookings b
             JOIN events e ON e.id = b.event_id
             LEFT JOIN rooms r ON r.id = b.room_id
             WHERE e.status = 'fixed'
             ORDER BY b.start_time ASC"
        )
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_upcoming_fixed(&self, now: DateTime<Utc>) -> Result<Vec<UpcomingMeeting>, AppError> {
        sqlx::query_as::<_, UpcomingMeeting>(
            "SELECT e.id AS event_id, e.title, e.location, e.meeting_url, r.name AS room_name,
                    e.join_reminder_minutes, e.channel_id, e.message_ts, b.start_time, b.end_time
             FROM bookings b
             JOIN events e ON e.id = b.event_id
             LEFT JOIN rooms r ON r.id = b.room_id
             WHERE e.status = 'fixed' AND b.start_time > ?
             ORDER BY b.start_time ASC"
        )
            .bind(now).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_unregistered(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT b.* FROM bookings b JOIN events e ON e.id = b.event_id
             WHERE e.status = 'fixed' AND b.external_calendar_id IS NULL AND b.end_time > ?
             ORDER BY b.start_time ASC LIMIT ?"
        )
            .bind(now).bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT b.* FROM bookings b JOIN events e ON e.id = b.event_id
             WHERE e.status = 'fixed' AND b.room_id IS NOT NULL AND b.end_time > ?
             ORDER BY b.start_time ASC"
        )
            .bind(now).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScheduleRow>, AppError> {
        sqlx::query_as::<_, ScheduleRow>(
            "SELECT 'booking' AS kind, b.event_id, b.room_id AS room_id, e.title, b.start_time, b.end_time
             FROM bookings b JOIN events e ON e.id = b.event_id
             WHERE e.status = 'fixed' AND b.room_id IS NOT NULL AND b.start_time < ? AND b.end_time > ?
             ORDER BY b.start_time ASC"
        )
            .bind(end).bind(start)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
