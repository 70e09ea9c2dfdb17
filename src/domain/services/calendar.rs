use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};
use tracing::{info, warn};
use crate::domain::models::booking::{Booking, ConfirmedBooking};
use crate::domain::ports::{BookingRepository, CalendarGateway, EventRepository, NewCalendarEntry, RoomRepository};
use crate::domain::services::effects::EffectOutcome;
use crate::error::AppError;
use std::sync::Arc;

pub const FEED_UID_DOMAIN: &str = "meeting-scheduler";

/// Generates the iCalendar feed of all confirmed bookings.
pub fn generate_feed(bookings: &[ConfirmedBooking]) -> String {
    let mut calendar = Calendar::new();
    calendar.name("Meetings");

    for b in bookings {
        let mut ical_event = IcalEvent::new();
        ical_event
            .uid(&format!("{}@{}", b.booking_id, FEED_UID_DOMAIN))
            .timestamp(b.updated_at)
            .summary(&b.title)
            .starts(b.start_time)
            .ends(b.end_time);

        match (&b.location, &b.meeting_url) {
            (Some(loc), _) => { ical_event.location(loc); }
            (None, Some(url)) => { ical_event.location(url); }
            (None, None) => {}
        }
        if let Some(url) = &b.meeting_url {
            ical_event.description(url);
        }

        calendar.push(ical_event.done());
    }

    calendar.done().to_string()
}

/// Mirrors decided and cancelled events into the external calendar.
pub struct CalendarReflector {
    gateway: Arc<dyn CalendarGateway>,
    events: Arc<dyn EventRepository>,
    rooms: Arc<dyn RoomRepository>,
    bookings: Arc<dyn BookingRepository>,
    default_calendar_id: String,
}

impl CalendarReflector {
    pub fn new(
        gateway: Arc<dyn CalendarGateway>,
        events: Arc<dyn EventRepository>,
        rooms: Arc<dyn RoomRepository>,
        bookings: Arc<dyn BookingRepository>,
        default_calendar_id: String,
    ) -> Self {
        Self { gateway, events, rooms, bookings, default_calendar_id }
    }

    pub fn is_enabled(&self) -> bool {
        self.gateway.is_enabled()
    }

    async fn calendar_for(&self, booking: &Booking) -> Result<String, AppError> {
        if let Some(room_id) = &booking.room_id
            && let Some(room) = self.rooms.find_by_id(room_id).await?
            && let Some(cal) = room.calendar_ref {
            return Ok(cal);
        }
        Ok(self.default_calendar_id.clone())
    }

    pub async fn register_fixed(&self, event_id: &str) -> Result<EffectOutcome, AppError> {
        if !self.gateway.is_enabled() {
            return Ok(EffectOutcome::Skipped);
        }

        let Some(booking) = self.bookings.find_by_event(event_id).await? else {
            return Ok(EffectOutcome::Skipped);
        };
        if booking.external_calendar_id.is_some() {
            return Ok(EffectOutcome::Skipped);
        }

        let event = self.events.find_by_id(event_id).await?
            .ok_or(AppError::NotFound(format!("Event {} not found", event_id)))?;
        let calendar_id = self.calendar_for(&booking).await?;

        let existing = self.gateway.find_in_window(&calendar_id, booking.start_time, booking.end_time).await?;
        if let Some(entry) = existing.iter().find(|e| e.start == booking.start_time && e.end == booking.end_time) {
            info!("Calendar entry {} already covers event {}, linking it", entry.id, event_id);
            self.bookings.set_external_id(&booking.id, &entry.id).await?;
            return Ok(EffectOutcome::Skipped);
        }

        let entry = NewCalendarEntry {
            summary: event.title.clone(),
            description: event.meeting_url.clone(),
            location: event.location.clone(),
            start: booking.start_time,
            end: booking.end_time,
        };
        let external_id = self.gateway.create_entry(&calendar_id, &entry).await?;
        if !self.bookings.set_external_id(&booking.id, &external_id).await? {
            // Released by a cancel, or linked by a concurrent pass, while the entry was being created.
            warn!("Booking for event {} changed meanwhile, removing calendar entry {}", event_id, external_id);
            self.gateway.delete_entry(&calendar_id, &external_id).await?;
            return Ok(EffectOutcome::Skipped);
        }
        info!("Registered event {} in calendar {} as {}", event_id, calendar_id, external_id);
        Ok(EffectOutcome::Done)
    }

    /// Removes the external entry of a booking released by a cancellation.
    pub async fn cancel_entry(&self, released: &Booking) -> Result<EffectOutcome, AppError> {
        if !self.gateway.is_enabled() {
            return Ok(EffectOutcome::Skipped);
        }
        let Some(external_id) = released.external_calendar_id.as_deref() else {
            return Ok(EffectOutcome::Skipped);
        };

        let calendar_id = self.calendar_for(released).await?;
        self.gateway.delete_entry(&calendar_id, external_id).await?;
        info!("Removed calendar entry {} for event {}", external_id, released.event_id);
        Ok(EffectOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_feed_uses_stable_uid_and_utc_times() {
        let start = Utc.with_ymd_and_hms(2030, 6, 1, 9, 30, 0).unwrap();
        let row = ConfirmedBooking {
            booking_id: "bk-42".into(),
            title: "Architecture sync".into(),
            location: Some("Room A".into()),
            meeting_url: None,
            start_time: start,
            end_time: start + Duration::hours(1),
            updated_at: start - Duration::days(1),
        };
        let feed = generate_feed(&[row.clone()]);
        assert!(feed.contains("UID:bk-42@meeting-scheduler"));
        assert!(feed.contains("DTSTART:20300601T093000Z"));
        assert!(feed.contains("DTEND:20300601T103000Z"));
        assert!(feed.contains("DTSTAMP:20300531T093000Z"));
        assert!(feed.contains("LOCATION:Room A"));
        assert_eq!(feed, generate_feed(&[row]));
    }
}
