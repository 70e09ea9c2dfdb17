use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use crate::domain::models::{
    booking::UpcomingMeeting,
    event::{Event, MessageRef},
    reminder::ReminderKind,
};
use crate::domain::ports::{AttendanceRepository, BookingRepository, ChatNotifier, EventRepository, ReminderRepository};
use crate::domain::services::{
    calendar::CalendarReflector,
    decision::{DecisionEngine, DecisionOutcome, Trigger},
    effects::EffectOutcome,
    messages,
};
use crate::error::AppError;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub batch_size: i64,
    pub default_vote_lead: Duration,
    pub default_join_lead: Duration,
    pub display_tz: Tz,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub decided: usize,
    pub deferred: usize,
    pub vote_reminders: usize,
    pub join_reminders: usize,
    pub calendar_registered: usize,
    pub failures: usize,
}

pub struct ReminderScheduler {
    events: Arc<dyn EventRepository>,
    bookings: Arc<dyn BookingRepository>,
    attendance: Arc<dyn AttendanceRepository>,
    reminders: Arc<dyn ReminderRepository>,
    notifier: Arc<dyn ChatNotifier>,
    engine: Arc<DecisionEngine>,
    calendar: Arc<CalendarReflector>,
    settings: SchedulerSettings,
}

pub struct ReminderSchedulerDeps {
    pub events: Arc<dyn EventRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub reminders: Arc<dyn ReminderRepository>,
    pub notifier: Arc<dyn ChatNotifier>,
    pub engine: Arc<DecisionEngine>,
    pub calendar: Arc<CalendarReflector>,
}

fn lead(minutes: Option<i32>, default: Duration) -> Duration {
    minutes.map(|m| Duration::minutes(i64::from(m))).unwrap_or(default)
}

pub fn vote_reminder_due(event: &Event, now: DateTime<Utc>, default_lead: Duration) -> bool {
    now >= event.deadline - lead(event.vote_reminder_minutes, default_lead)
}

pub fn join_reminder_due(meeting: &UpcomingMeeting, now: DateTime<Utc>, default_lead: Duration) -> bool {
    now >= meeting.start_time - lead(meeting.join_reminder_minutes, default_lead)
}

impl ReminderScheduler {
    pub fn new(deps: ReminderSchedulerDeps, settings: SchedulerSettings) -> Self {
        Self {
            events: deps.events,
            bookings: deps.bookings,
            attendance: deps.attendance,
            reminders: deps.reminders,
            notifier: deps.notifier,
            engine: deps.engine,
            calendar: deps.calendar,
            settings,
        }
    }

    /// One scheduler pass. Each scan runs even if an earlier one failed.
    pub async fn run_pass(&self, now: DateTime<Utc>) -> PassReport {
        let mut report = PassReport::default();

        if let Err(e) = self.auto_decide_scan(now, &mut report).await {
            error!("Auto-decide scan failed: {}", e);
            report.failures += 1;
        }
        if let Err(e) = self.vote_reminder_scan(now, &mut report).await {
            error!("Vote-reminder scan failed: {}", e);
            report.failures += 1;
        }
        if let Err(e) = self.join_reminder_scan(now, &mut report).await {
            error!("Join-reminder scan failed: {}", e);
            report.failures += 1;
        }
        if let Err(e) = self.calendar_backfill_scan(now, &mut report).await {
            error!("Calendar back-fill scan failed: {}", e);
            report.failures += 1;
        }

        report
    }

    pub async fn auto_decide_scan(&self, now: DateTime<Utc>, report: &mut PassReport) -> Result<(), AppError> {
        let due = self.events.list_due_for_decision(now, self.settings.batch_size).await?;
        for event in due {
            match self.engine.decide(&event.id, Trigger::Auto).await {
                Ok(DecisionOutcome::Decided(_)) => report.decided += 1,
                Ok(DecisionOutcome::Deferred { .. }) => report.deferred += 1,
                Ok(_) => {}
                Err(AppError::NotFound(_)) => debug!("Event {} vanished before its decision", event.id),
                Err(e) => {
                    error!("Automatic decision for event {} failed: {}", event.id, e);
                    report.failures += 1;
                }
            }
        }
        Ok(())
    }

    pub async fn vote_reminder_scan(&self, now: DateTime<Utc>, report: &mut PassReport) -> Result<(), AppError> {
        // Past-deadline events stay eligible while they are planning, e.g. after a deferred decision.
        let planning = self.events.list_planning().await?;

        for event in planning.iter().filter(|e| vote_reminder_due(e, now, self.settings.default_vote_lead)) {
            let pending = self.events.list_pending_voters(&event.id).await?;
            if pending.is_empty() {
                continue;
            }

            let permalink = self.permalink(event.message_ref()).await;
            let text = messages::vote_reminder(event, permalink.as_deref(), self.settings.display_tz);

            for user_id in pending {
                if self.claim_and_send(&event.id, &user_id, ReminderKind::Vote, &text).await? {
                    report.vote_reminders += 1;
                }
            }
        }
        Ok(())
    }

    pub async fn join_reminder_scan(&self, now: DateTime<Utc>, report: &mut PassReport) -> Result<(), AppError> {
        let upcoming = self.bookings.list_upcoming_fixed(now).await?;

        for meeting in upcoming.iter().filter(|m| join_reminder_due(m, now, self.settings.default_join_lead)) {
            let participants = self.attendance.list_by_event(&meeting.event_id).await?;
            if participants.is_empty() {
                continue;
            }

            let message = match (&meeting.channel_id, &meeting.message_ts) {
                (Some(channel), Some(ts)) => Some(MessageRef { channel: channel.clone(), ts: ts.clone() }),
                _ => None,
            };
            let permalink = self.permalink(message).await;
            let text = messages::join_reminder(meeting, permalink.as_deref(), self.settings.display_tz);

            for entry in participants {
                if self.claim_and_send(&meeting.event_id, &entry.user_id, ReminderKind::Join, &text).await? {
                    report.join_reminders += 1;
                }
            }
        }
        Ok(())
    }

    /// Retries calendar registration for upcoming bookings that never got an external id.
    pub async fn calendar_backfill_scan(&self, now: DateTime<Utc>, report: &mut PassReport) -> Result<(), AppError> {
        if !self.calendar.is_enabled() {
            return Ok(());
        }

        for booking in self.bookings.list_unregistered(now, self.settings.batch_size).await? {
            match self.calendar.register_fixed(&booking.event_id).await {
                Ok(EffectOutcome::Done) => report.calendar_registered += 1,
                Ok(_) => {}
                Err(e) => warn!("Calendar registration retry for event {} failed: {}", booking.event_id, e),
            }
        }
        Ok(())
    }

    /// The claim must be persisted before sending: a crash in between loses
    /// the reminder instead of duplicating it.
    async fn claim_and_send(&self, event_id: &str, user_id: &str, kind: ReminderKind, text: &str) -> Result<bool, AppError> {
        if !self.reminders.claim(event_id, user_id, kind).await? {
            debug!("{} reminder for {} on {} already claimed", kind, user_id, event_id);
            return Ok(false);
        }

        match self.notifier.send_direct_message(user_id, text).await {
            Ok(()) => {
                info!("Sent {} reminder to {} for event {}", kind, user_id, event_id);
                Ok(true)
            }
            Err(e) => {
                warn!("Claimed {} reminder for {} on {} but sending failed: {}", kind, user_id, event_id, e);
                Ok(false)
            }
        }
    }

    async fn permalink(&self, message: Option<MessageRef>) -> Option<String> {
        let message = message?;
        match self.notifier.resolve_permalink(&message).await {
            Ok(link) => link,
            Err(e) => {
                warn!("Could not resolve permalink for {}/{}: {}", message.channel, message.ts, e);
                None
            }
        }
    }
}
