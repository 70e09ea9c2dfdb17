use crate::domain::models::{
    attendance::AttendanceEntry,
    booking::{Booking, ConfirmedBooking, OverlappingBooking, ScheduleRow, UpcomingMeeting},
    event::{Event, EventOption, EventStatus, MessageRef},
    reminder::ReminderKind,
    room::Room,
    vote::{SlotTally, Vote},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of a conditional status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<T> {
    Applied(T),
    /// The event was not in the expected status; nothing was written.
    Lost,
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn create(&self, room: &Room) -> Result<Room, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Room>, AppError>;
    async fn list(&self) -> Result<Vec<Room>, AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Persists the event, its candidate slots and required attendees in one transaction.
    async fn create(&self, event: &Event, options: &[EventOption], attendees: &[String]) -> Result<Event, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Event>, AppError>;
    async fn list_options(&self, event_id: &str) -> Result<Vec<EventOption>, AppError>;
    async fn find_option(&self, option_id: &str) -> Result<Option<EventOption>, AppError>;
    async fn set_message_ref(&self, event_id: &str, message: &MessageRef) -> Result<(), AppError>;
    /// Moves a planning event to fixed, snapshots its attendance and writes its booking in one
    /// transaction. Returns the event's booking, or `Lost` if the event was no longer planning.
    async fn commit_decision(&self, event_id: &str, attendance: &[AttendanceEntry], booking: &Booking) -> Result<Transition<Booking>, AppError>;
    /// Moves the event from `expected` to closed and deletes its booking in one transaction.
    async fn close_event(&self, event_id: &str, expected: EventStatus) -> Result<Transition<Option<Booking>>, AppError>;
    async fn list_due_for_decision(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Event>, AppError>;
    async fn list_planning(&self) -> Result<Vec<Event>, AppError>;
    async fn list_required_attendees(&self, event_id: &str) -> Result<Vec<String>, AppError>;
    /// Required attendees who have not voted on any slot of the event.
    async fn list_pending_voters(&self, event_id: &str) -> Result<Vec<String>, AppError>;
    async fn list_candidate_slots_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScheduleRow>, AppError>;
}

#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn upsert(&self, vote: &Vote) -> Result<Vote, AppError>;
    async fn find(&self, option_id: &str, user_id: &str) -> Result<Option<Vote>, AppError>;
    /// Per-slot counts ordered by slot start ascending.
    async fn aggregate(&self, event_id: &str) -> Result<Vec<SlotTally>, AppError>;
    async fn count_yes(&self, option_id: &str) -> Result<i64, AppError>;
    async fn list_yes_voters(&self, option_id: &str) -> Result<Vec<String>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_event(&self, event_id: &str) -> Result<Option<Booking>, AppError>;
    /// Sets the external id only if none is stored yet and the booking still exists.
    async fn set_external_id(&self, booking_id: &str, external_id: &str) -> Result<bool, AppError>;
    /// Bookings of fixed events in `room_id` overlapping `[start, end)`.
    async fn find_overlapping(&self, room_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, excluding_event_id: Option<&str>) -> Result<Vec<OverlappingBooking>, AppError>;
    async fn list_confirmed(&self) -> Result<Vec<ConfirmedBooking>, AppError>;
    async fn list_upcoming_fixed(&self, now: DateTime<Utc>) -> Result<Vec<UpcomingMeeting>, AppError>;
    async fn list_unregistered(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Booking>, AppError>;
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    async fn list_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ScheduleRow>, AppError>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn list_by_event(&self, event_id: &str) -> Result<Vec<AttendanceEntry>, AppError>;
}

#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Conditional insert of the `(event, user, kind)` ticket. Only a `true` result authorizes sending.
    async fn claim(&self, event_id: &str, user_id: &str, kind: ReminderKind) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn publish_vote_message(&self, channel: &str, text: &str) -> Result<MessageRef, AppError>;
    async fn update_vote_message(&self, message: &MessageRef, text: &str) -> Result<(), AppError>;
    async fn post_thread_reply(&self, message: &MessageRef, text: &str) -> Result<(), AppError>;
    async fn send_direct_message(&self, user_id: &str, text: &str) -> Result<(), AppError>;
    async fn resolve_permalink(&self, message: &MessageRef) -> Result<Option<String>, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntry {
    pub id: String,
    pub summary: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCalendarEntry {
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[async_trait]
pub trait CalendarGateway: Send + Sync {
    fn is_enabled(&self) -> bool {
        true
    }
    async fn find_in_window(&self, calendar_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<CalendarEntry>, AppError>;
    async fn create_entry(&self, calendar_id: &str, entry: &NewCalendarEntry) -> Result<String, AppError>;
    async fn delete_entry(&self, calendar_id: &str, entry_id: &str) -> Result<(), AppError>;
}
