pub mod sqlite_room_repo;
pub mod sqlite_event_repo;
pub mod sqlite_vote_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_attendance_repo;
pub mod sqlite_reminder_repo;

pub mod postgres_room_repo;
pub mod postgres_event_repo;
pub mod postgres_vote_repo;
pub mod postgres_booking_repo;
pub mod postgres_attendance_repo;
pub mod postgres_reminder_repo;
