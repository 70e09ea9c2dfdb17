use std::sync::Arc;
use chrono::Duration;
use crate::config::Config;
use crate::domain::ports::{
    AttendanceRepository, BookingRepository, CalendarGateway, ChatNotifier, EventRepository,
    ReminderRepository, RoomRepository, VoteRepository,
};
use crate::domain::services::{
    availability::AvailabilityService,
    calendar::CalendarReflector,
    commands::{CommandDispatcher, CommandDispatcherDeps},
    decision::{DecisionEngine, DecisionEngineDeps},
    ledger::VoteLedger,
    reminder::{ReminderScheduler, ReminderSchedulerDeps, SchedulerSettings},
};

/// One adapter per persistence port, all backed by the same pool.
#[derive(Clone)]
pub struct Repositories {
    pub rooms: Arc<dyn RoomRepository>,
    pub events: Arc<dyn EventRepository>,
    pub votes: Arc<dyn VoteRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub reminders: Arc<dyn ReminderRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub room_repo: Arc<dyn RoomRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub vote_repo: Arc<dyn VoteRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub attendance_repo: Arc<dyn AttendanceRepository>,
    pub reminder_repo: Arc<dyn ReminderRepository>,
    pub notifier: Arc<dyn ChatNotifier>,
    pub calendar: Arc<CalendarReflector>,
    pub ledger: Arc<VoteLedger>,
    pub decision_engine: Arc<DecisionEngine>,
    pub scheduler: Arc<ReminderScheduler>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub availability: Arc<AvailabilityService>,
}

impl AppState {
    /// Wires the core services on top of the given adapters.
    pub fn assemble(
        config: Config,
        repos: Repositories,
        notifier: Arc<dyn ChatNotifier>,
        gateway: Arc<dyn CalendarGateway>,
    ) -> Self {
        let tz = config.display_timezone;

        let calendar = Arc::new(CalendarReflector::new(
            gateway,
            repos.events.clone(),
            repos.rooms.clone(),
            repos.bookings.clone(),
            config.calendar_id.clone(),
        ));

        let ledger = Arc::new(VoteLedger::new(repos.events.clone(), repos.votes.clone()));

        let decision_engine = Arc::new(DecisionEngine::new(
            DecisionEngineDeps {
                events: repos.events.clone(),
                votes: repos.votes.clone(),
                rooms: repos.rooms.clone(),
                bookings: repos.bookings.clone(),
                notifier: notifier.clone(),
                calendar: calendar.clone(),
            },
            tz,
        ));

        let scheduler = Arc::new(ReminderScheduler::new(
            ReminderSchedulerDeps {
                events: repos.events.clone(),
                bookings: repos.bookings.clone(),
                attendance: repos.attendance.clone(),
                reminders: repos.reminders.clone(),
                notifier: notifier.clone(),
                engine: decision_engine.clone(),
                calendar: calendar.clone(),
            },
            SchedulerSettings {
                batch_size: config.scheduler_batch_size,
                default_vote_lead: Duration::minutes(config.default_vote_reminder_minutes),
                default_join_lead: Duration::minutes(config.default_join_reminder_minutes),
                display_tz: tz,
            },
        ));

        let dispatcher = Arc::new(CommandDispatcher::new(
            CommandDispatcherDeps {
                events: repos.events.clone(),
                rooms: repos.rooms.clone(),
                bookings: repos.bookings.clone(),
                notifier: notifier.clone(),
                ledger: ledger.clone(),
                engine: decision_engine.clone(),
            },
            config.chat_channel.clone(),
            tz,
        ));

        let availability = Arc::new(AvailabilityService::new(
            repos.rooms.clone(),
            repos.events.clone(),
            repos.bookings.clone(),
            tz,
        ));

        Self {
            config,
            room_repo: repos.rooms,
            event_repo: repos.events,
            vote_repo: repos.votes,
            booking_repo: repos.bookings,
            attendance_repo: repos.attendance,
            reminder_repo: repos.reminders,
            notifier,
            calendar,
            ledger,
            decision_engine,
            scheduler,
            dispatcher,
            availability,
        }
    }
}
