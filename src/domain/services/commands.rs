use std::sync::Arc;
use chrono_tz::Tz;
use tracing::{info, warn};
use crate::domain::models::{
    command::{CandidateSlot, Command, CommandReply, EventStatusView, NewEventRequest},
    event::{Event, EventOption, EventStatus, NewEventParams},
    vote::VoteChoice,
};
use crate::domain::ports::{BookingRepository, ChatNotifier, EventRepository, RoomRepository};
use crate::domain::services::{
    capacity::check_capacity,
    decision::{DecisionEngine, DecisionOutcome, Trigger},
    effects::{fire_and_forget, EffectKind, EffectOutcome},
    ledger::VoteLedger,
    messages,
};
use crate::error::AppError;

pub struct CommandDispatcherDeps {
    pub events: Arc<dyn EventRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub notifier: Arc<dyn ChatNotifier>,
    pub ledger: Arc<VoteLedger>,
    pub engine: Arc<DecisionEngine>,
}

/// Executes validated chat commands against the core services.
pub struct CommandDispatcher {
    events: Arc<dyn EventRepository>,
    rooms: Arc<dyn RoomRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn ChatNotifier>,
    ledger: Arc<VoteLedger>,
    engine: Arc<DecisionEngine>,
    channel: String,
    display_tz: Tz,
}

impl CommandDispatcher {
    pub fn new(deps: CommandDispatcherDeps, channel: String, display_tz: Tz) -> Self {
        Self {
            events: deps.events,
            rooms: deps.rooms,
            bookings: deps.bookings,
            notifier: deps.notifier,
            ledger: deps.ledger,
            engine: deps.engine,
            channel,
            display_tz,
        }
    }

    pub async fn dispatch(&self, command: Command) -> Result<CommandReply, AppError> {
        command.validate()?;

        match command {
            Command::NewEventRequested(req) => self.create_event(req).await,
            Command::VoteCast { option_id, voter_id, choice } => self.cast_vote(&option_id, &voter_id, choice).await,
            Command::StatusRequested { event_id } => Ok(CommandReply::Status(self.status(&event_id).await?)),
            Command::CloseRequested { event_id, requester_id } => self.close(&event_id, &requester_id).await,
            Command::CancelRequested { event_id, requester_id } => self.cancel(&event_id, &requester_id).await,
        }
    }

    async fn create_event(&self, req: NewEventRequest) -> Result<CommandReply, AppError> {
        let room = match &req.room_id {
            Some(room_id) => Some(
                self.rooms.find_by_id(room_id).await?
                    .ok_or(AppError::NotFound(format!("Room {} not found", room_id)))?,
            ),
            None => None,
        };

        let slots = req.distinct_slots();
        let attendees = req.distinct_attendees();
        let headcount = attendees.len() as i64;

        // Speculative: only required attendees are known before anyone votes.
        for slot in &slots {
            let verdict = check_capacity(self.bookings.as_ref(), room.as_ref(), slot.start, slot.end, headcount, None).await?;
            if let Err(e) = verdict.into_result(headcount) {
                warn!(
                    "Rejecting new event '{}': slot {} does not fit the room",
                    req.title, messages::format_range(slot.start, slot.end, self.display_tz)
                );
                return Err(e);
            }
        }

        let event = Event::new(NewEventParams {
            title: req.title.trim().to_string(),
            project: req.project,
            room_id: req.room_id,
            location: req.location,
            meeting_url: req.meeting_url,
            deadline: req.deadline,
            created_by: req.created_by,
            vote_reminder_minutes: req.vote_reminder_minutes,
            join_reminder_minutes: req.join_reminder_minutes,
        });
        let options: Vec<EventOption> = slots.iter()
            .map(|s| EventOption::new(event.id.clone(), s.start, s.end))
            .collect();

        let mut event = self.events.create(&event, &options, &attendees).await?;
        let options = self.events.list_options(&event.id).await?;
        info!("Event {} created with {} candidate slots", event.id, options.len());

        let tallies = self.ledger.aggregate(&event.id).await?;
        let text = messages::vote_message(&event, &tallies, self.display_tz);
        let notifier = self.notifier.clone();
        let events = self.events.clone();
        let channel = self.channel.clone();
        let event_id = event.id.clone();
        let published = fire_and_forget(EffectKind::VoteMessagePublish, &event.id, async move {
            let message = notifier.publish_vote_message(&channel, &text).await?;
            events.set_message_ref(&event_id, &message).await?;
            Ok::<_, AppError>(EffectOutcome::Done)
        }).await;

        if !published.failed()
            && let Some(reloaded) = self.events.find_by_id(&event.id).await? {
            event = reloaded;
        }

        Ok(CommandReply::EventCreated { event, options })
    }

    async fn cast_vote(&self, option_id: &str, voter_id: &str, choice: VoteChoice) -> Result<CommandReply, AppError> {
        let option = self.events.find_option(option_id).await?
            .ok_or(AppError::NotFound(format!("Candidate slot {} not found", option_id)))?;
        let event = self.load_event(&option.event_id).await?;
        if event.status != EventStatus::Planning {
            return Err(AppError::InvalidState(format!("Voting on this event has ended ({})", event.status)));
        }

        let vote = self.ledger.cast_vote(option_id, voter_id, choice).await?;

        if let Some(message) = event.message_ref() {
            let tallies = self.ledger.aggregate(&event.id).await?;
            let text = messages::vote_message(&event, &tallies, self.display_tz);
            let notifier = self.notifier.clone();
            fire_and_forget(EffectKind::VoteMessageRefresh, &event.id, async move {
                notifier.update_vote_message(&message, &text).await?;
                Ok::<_, AppError>(EffectOutcome::Done)
            }).await;
        }

        Ok(CommandReply::VoteRecorded { vote })
    }

    pub async fn status(&self, event_id: &str) -> Result<EventStatusView, AppError> {
        let event = self.load_event(event_id).await?;
        let options = self.ledger.aggregate(event_id).await?;
        let booking = match event.status {
            EventStatus::Fixed => self.bookings.find_by_event(event_id).await?,
            _ => None,
        };
        Ok(EventStatusView { event, options, booking })
    }

    async fn close(&self, event_id: &str, requester_id: &str) -> Result<CommandReply, AppError> {
        let event = self.load_event(event_id).await?;
        ensure_creator(&event, requester_id)?;
        if event.status != EventStatus::Planning {
            return Err(AppError::InvalidState(format!("Event is already {}", event.status)));
        }

        match self.engine.decide(event_id, Trigger::Manual).await? {
            DecisionOutcome::Decided(decision) => Ok(CommandReply::Decided {
                event_id: decision.event_id,
                start: decision.winner.start_time,
                end: decision.winner.end_time,
                attendees: decision.attendees,
            }),
            DecisionOutcome::NothingToDecide => Ok(CommandReply::NothingToDecide { event_id: event_id.to_string() }),
            DecisionOutcome::AlreadyDecided => Ok(CommandReply::AlreadyDecided { event_id: event_id.to_string() }),
            DecisionOutcome::Deferred { existing, requested, capacity } => {
                Err(AppError::CapacityExceeded { existing, requested, capacity })
            }
        }
    }

    async fn cancel(&self, event_id: &str, requester_id: &str) -> Result<CommandReply, AppError> {
        let event = self.load_event(event_id).await?;
        ensure_creator(&event, requester_id)?;

        let cancellation = self.engine.cancel(event_id).await?;
        Ok(CommandReply::Cancelled {
            event_id: cancellation.event_id,
            released: cancellation.released.map(|b| CandidateSlot { start: b.start_time, end: b.end_time }),
        })
    }

    async fn load_event(&self, event_id: &str) -> Result<Event, AppError> {
        self.events.find_by_id(event_id).await?
            .ok_or(AppError::NotFound(format!("Event {} not found", event_id)))
    }
}

fn ensure_creator(event: &Event, requester_id: &str) -> Result<(), AppError> {
    if event.created_by != requester_id {
        return Err(AppError::Forbidden("Only the organizer can close or cancel this event".into()));
    }
    Ok(())
}
