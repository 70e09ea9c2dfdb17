use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use crate::domain::models::{
    attendance::AttendanceEntry,
    booking::Booking,
    event::{Event, EventStatus},
    vote::SlotTally,
};
use crate::domain::ports::{BookingRepository, ChatNotifier, EventRepository, RoomRepository, Transition, VoteRepository};
use crate::domain::services::{
    calendar::CalendarReflector,
    capacity::{check_capacity, evaluate, CapacityVerdict},
    effects::{fire_and_forget, EffectKind, EffectOutcome, EffectReport},
    messages,
};
use crate::error::AppError;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Periodic deadline scan. Capacity failures are deferred silently.
    Auto,
    /// Creator-initiated close. Capacity failures are reported.
    Manual,
}

/// Ordering of candidate slots, best first: more yes, then fewer maybe, then earlier start.
pub fn rank(a: &SlotTally, b: &SlotTally) -> Ordering {
    b.yes_count.cmp(&a.yes_count)
        .then_with(|| a.maybe_count.cmp(&b.maybe_count))
        .then_with(|| a.start_time.cmp(&b.start_time))
        .then_with(|| a.end_time.cmp(&b.end_time))
        .then_with(|| a.option_id.cmp(&b.option_id))
}

pub fn select_winner(tallies: &[SlotTally]) -> Option<&SlotTally> {
    tallies.iter().min_by(|a, b| rank(a, b))
}

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub event_id: String,
    pub winner: SlotTally,
    pub booking: Booking,
    pub attendees: Vec<String>,
    pub effects: Vec<EffectReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecisionOutcome {
    Decided(Decision),
    NothingToDecide,
    /// Another trigger won the status transition first.
    AlreadyDecided,
    /// Automatic decision postponed because the room is full.
    Deferred {
        existing: i64,
        requested: i64,
        capacity: Option<i64>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Cancellation {
    pub event_id: String,
    pub released: Option<Booking>,
    pub effects: Vec<EffectReport>,
}

pub struct DecisionEngine {
    events: Arc<dyn EventRepository>,
    votes: Arc<dyn VoteRepository>,
    rooms: Arc<dyn RoomRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn ChatNotifier>,
    calendar: Arc<CalendarReflector>,
    display_tz: Tz,
}

pub struct DecisionEngineDeps {
    pub events: Arc<dyn EventRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub notifier: Arc<dyn ChatNotifier>,
    pub calendar: Arc<CalendarReflector>,
}

impl DecisionEngine {
    pub fn new(deps: DecisionEngineDeps, display_tz: Tz) -> Self {
        Self {
            events: deps.events,
            votes: deps.votes,
            rooms: deps.rooms,
            bookings: deps.bookings,
            notifier: deps.notifier,
            calendar: deps.calendar,
            display_tz,
        }
    }

    pub async fn decide(&self, event_id: &str, trigger: Trigger) -> Result<DecisionOutcome, AppError> {
        let span = info_span!("decide", event_id = %event_id, trigger = ?trigger);
        self.decide_inner(event_id, trigger).instrument(span).await
    }

    async fn decide_inner(&self, event_id: &str, trigger: Trigger) -> Result<DecisionOutcome, AppError> {
        let event = self.events.find_by_id(event_id).await?
            .ok_or(AppError::NotFound(format!("Event {} not found", event_id)))?;

        match event.status {
            EventStatus::Planning => {}
            EventStatus::Fixed => return Ok(DecisionOutcome::AlreadyDecided),
            EventStatus::Closed => return Err(AppError::InvalidState("Event has been cancelled".into())),
        }

        let tallies = self.votes.aggregate(event_id).await?;
        let Some(winner) = select_winner(&tallies).cloned() else {
            info!("No candidate slots, nothing to decide");
            return Ok(DecisionOutcome::NothingToDecide);
        };

        if let Some(room_id) = &event.room_id {
            let yes_count = self.votes.count_yes(&winner.option_id).await?;
            let verdict = match self.rooms.find_by_id(room_id).await? {
                Some(room) => check_capacity(
                    self.bookings.as_ref(), Some(&room), winner.start_time, winner.end_time, yes_count, Some(event_id),
                ).await?,
                None => {
                    warn!("Room {} no longer exists, treating its capacity as unknown", room_id);
                    let overlapping = self.bookings
                        .find_overlapping(room_id, winner.start_time, winner.end_time, Some(event_id)).await?;
                    evaluate(None, &overlapping, yes_count)
                }
            };

            if let CapacityVerdict::Exceeded { existing, capacity } = verdict {
                return match trigger {
                    Trigger::Manual => Err(AppError::CapacityExceeded { existing, requested: yes_count, capacity }),
                    Trigger::Auto => {
                        info!(existing, yes_count, ?capacity, "Room {} is full, deferring decision", room_id);
                        Ok(DecisionOutcome::Deferred { existing, requested: yes_count, capacity })
                    }
                };
            }
        }

        let attendees = self.votes.list_yes_voters(&winner.option_id).await?;
        let entries: Vec<AttendanceEntry> = attendees.iter()
            .map(|user| AttendanceEntry::snapshot(event_id, &winner, user.clone()))
            .collect();
        let booking = Booking::new(event_id.to_string(), event.room_id.clone(), winner.start_time, winner.end_time);

        // Status, attendance and booking commit together or not at all.
        let booking = match self.events.commit_decision(event_id, &entries, &booking).await? {
            Transition::Applied(stored) => stored,
            Transition::Lost => return self.lost_transition(event_id).await,
        };

        info!(
            "Event decided for {} with {} attendees",
            winner.start_time.to_rfc3339(), attendees.len()
        );

        let effects = vec![
            self.post_notice(&event, EffectKind::DecisionNotice, messages::decision_notice(&event, &winner, self.display_tz)).await,
            fire_and_forget(EffectKind::CalendarRegister, event_id, self.calendar.register_fixed(event_id)).await,
        ];

        Ok(DecisionOutcome::Decided(Decision {
            event_id: event_id.to_string(),
            winner,
            booking,
            attendees,
            effects,
        }))
    }

    async fn lost_transition(&self, event_id: &str) -> Result<DecisionOutcome, AppError> {
        let current = self.events.find_by_id(event_id).await?
            .ok_or(AppError::NotFound(format!("Event {} not found", event_id)))?;
        if current.status == EventStatus::Closed {
            info!("Event was cancelled while deciding");
            return Err(AppError::InvalidState("Event has been cancelled".into()));
        }
        info!("Lost the transition race, event already decided");
        Ok(DecisionOutcome::AlreadyDecided)
    }

    /// Closes an event for good. Cancelling an already closed event is rejected.
    pub async fn cancel(&self, event_id: &str) -> Result<Cancellation, AppError> {
        let mut event = self.events.find_by_id(event_id).await?
            .ok_or(AppError::NotFound(format!("Event {} not found", event_id)))?;

        // A concurrent decision may move planning -> fixed between our read and write.
        let mut attempts = 0;
        let released = loop {
            if event.status == EventStatus::Closed {
                return Err(AppError::InvalidState("Event is already cancelled".into()));
            }
            if let Transition::Applied(released) = self.events.close_event(event_id, event.status).await? {
                break released;
            }
            attempts += 1;
            if attempts >= 3 {
                return Err(AppError::Conflict("Event changed concurrently, please retry".into()));
            }
            event = self.events.find_by_id(event_id).await?
                .ok_or(AppError::NotFound(format!("Event {} not found", event_id)))?;
        };
        info!("Event {} cancelled, released booking: {}", event_id, released.is_some());

        let calendar = match &released {
            Some(booking) => fire_and_forget(EffectKind::CalendarCancel, event_id, self.calendar.cancel_entry(booking)).await,
            None => EffectReport::skipped(EffectKind::CalendarCancel),
        };

        let interval = released.as_ref().map(|b| (b.start_time, b.end_time));
        let notice = self.post_notice(
            &event, EffectKind::CancellationNotice, messages::cancellation_notice(&event, interval, self.display_tz),
        ).await;

        Ok(Cancellation {
            event_id: event_id.to_string(),
            released,
            effects: vec![calendar, notice],
        })
    }

    async fn post_notice(&self, event: &Event, kind: EffectKind, text: String) -> EffectReport {
        let Some(message) = event.message_ref() else {
            return EffectReport::skipped(kind);
        };
        let notifier = self.notifier.clone();
        fire_and_forget(kind, &event.id, async move {
            notifier.post_thread_reply(&message, &text).await?;
            Ok::<_, AppError>(EffectOutcome::Done)
        }).await
    }
}
