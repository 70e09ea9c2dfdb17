use meeting_scheduler::{
    api::router::create_router,
    config::Config,
    domain::models::{
        command::{CandidateSlot, Command, CommandReply, NewEventRequest},
        event::MessageRef,
        room::Room,
        vote::VoteChoice,
    },
    domain::ports::{CalendarEntry, CalendarGateway, ChatNotifier, NewCalendarEntry},
    error::AppError,
    infra::factory::{connect_sqlite, sqlite_repositories},
    state::{AppState, Repositories},
};
use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::{Pool, Sqlite};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Published { channel: String, text: String },
    Updated { ts: String, text: String },
    ThreadReply { ts: String, text: String },
    Direct { user_id: String, text: String },
}

#[derive(Default)]
pub struct MockChatNotifier {
    pub sent: Mutex<Vec<Sent>>,
    pub fail: AtomicBool,
    counter: AtomicUsize,
}

#[allow(dead_code)]
impl MockChatNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn direct_messages_to(&self, user_id: &str) -> Vec<String> {
        self.sent().into_iter()
            .filter_map(|s| match s {
                Sent::Direct { user_id: u, text } if u == user_id => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn thread_replies(&self) -> Vec<String> {
        self.sent().into_iter()
            .filter_map(|s| match s {
                Sent::ThreadReply { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::External("chat platform unavailable".into()));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl ChatNotifier for MockChatNotifier {
    async fn publish_vote_message(&self, channel: &str, text: &str) -> Result<MessageRef, AppError> {
        self.record(Sent::Published { channel: channel.to_string(), text: text.to_string() })?;
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(MessageRef { channel: channel.to_string(), ts: format!("1700000000.{:06}", n) })
    }

    async fn update_vote_message(&self, message: &MessageRef, text: &str) -> Result<(), AppError> {
        self.record(Sent::Updated { ts: message.ts.clone(), text: text.to_string() })
    }

    async fn post_thread_reply(&self, message: &MessageRef, text: &str) -> Result<(), AppError> {
        self.record(Sent::ThreadReply { ts: message.ts.clone(), text: text.to_string() })
    }

    async fn send_direct_message(&self, user_id: &str, text: &str) -> Result<(), AppError> {
        self.record(Sent::Direct { user_id: user_id.to_string(), text: text.to_string() })
    }

    async fn resolve_permalink(&self, message: &MessageRef) -> Result<Option<String>, AppError> {
        Ok(Some(format!("https://chat.test/archives/{}/p{}", message.channel, message.ts.replace('.', ""))))
    }
}

#[derive(Default)]
pub struct MockCalendarGateway {
    pub entries: Mutex<Vec<(String, CalendarEntry)>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    counter: AtomicUsize,
}

#[allow(dead_code)]
impl MockCalendarGateway {
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Seeds an entry as if someone had created it by hand.
    pub fn seed(&self, calendar_id: &str, id: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.entries.lock().unwrap().push((
            calendar_id.to_string(),
            CalendarEntry { id: id.to_string(), summary: Some("Manual".into()), start, end },
        ));
    }

    fn check(&self) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::External("calendar unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarGateway for MockCalendarGateway {
    async fn find_in_window(&self, calendar_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<CalendarEntry>, AppError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().iter()
            .filter(|(cal, e)| cal == calendar_id && e.start < end && e.end > start)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn create_entry(&self, calendar_id: &str, entry: &NewCalendarEntry) -> Result<String, AppError> {
        self.check()?;
        let id = format!("cal-{}", self.counter.fetch_add(1, Ordering::SeqCst));
        self.entries.lock().unwrap().push((
            calendar_id.to_string(),
            CalendarEntry { id: id.clone(), summary: Some(entry.summary.clone()), start: entry.start, end: entry.end },
        ));
        Ok(id)
    }

    async fn delete_entry(&self, _calendar_id: &str, entry_id: &str) -> Result<(), AppError> {
        self.check()?;
        self.entries.lock().unwrap().retain(|(_, e)| e.id != entry_id);
        self.deleted.lock().unwrap().push(entry_id.to_string());
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub chat: Arc<MockChatNotifier>,
    pub calendar: Arc<MockCalendarGateway>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_repositories(|repos| repos).await
    }

    /// Builds the app with the SQLite adapters passed through `wrap` first.
    pub async fn with_repositories(wrap: impl FnOnce(Repositories) -> Repositories) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let pool = connect_sqlite(&db_url).await.expect("Failed to prepare test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            chat_api_url: "http://localhost".to_string(),
            chat_api_token: "token".to_string(),
            chat_channel: "C-MEETINGS".to_string(),
            calendar_api_url: Some("http://localhost".to_string()),
            calendar_api_token: "token".to_string(),
            calendar_id: "primary".to_string(),
            scheduler_interval_secs: 600,
            scheduler_batch_size: 10,
            default_vote_reminder_minutes: 60,
            default_join_reminder_minutes: 10,
            display_timezone: chrono_tz::Asia::Tokyo,
        };

        let chat = Arc::new(MockChatNotifier::default());
        let calendar = Arc::new(MockCalendarGateway::default());

        let state = Arc::new(AppState::assemble(
            config,
            wrap(sqlite_repositories(pool.clone())),
            chat.clone(),
            calendar.clone(),
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            chat,
            calendar,
        }
    }

    pub async fn create_room(&self, name: &str, capacity: Option<i32>) -> Room {
        self.state.room_repo.create(&Room::new(name.to_string(), capacity, None)).await.unwrap()
    }

    /// Creates an event through the dispatcher and returns its id and slot ids (earliest first).
    pub async fn new_event(&self, spec: EventSpec) -> (String, Vec<String>) {
        let reply = self.state.dispatcher.dispatch(Command::NewEventRequested(spec.into_request())).await.unwrap();
        match reply {
            CommandReply::EventCreated { event, options } => (event.id, options.into_iter().map(|o| o.id).collect()),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    pub async fn vote(&self, option_id: &str, voter: &str, choice: VoteChoice) {
        self.state.dispatcher.dispatch(Command::VoteCast {
            option_id: option_id.to_string(),
            voter_id: voter.to_string(),
            choice,
        }).await.unwrap();
    }

    pub async fn vote_many(&self, option_id: &str, voters: &[&str], choice: VoteChoice) {
        for voter in voters {
            self.vote(option_id, voter, choice).await;
        }
    }

    pub async fn count(&self, sql: &str, event_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql).bind(event_id).fetch_one(&self.pool).await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

/// Builder for new-event requests in tests.
#[allow(dead_code)]
pub struct EventSpec {
    pub title: String,
    pub room_id: Option<String>,
    pub creator: String,
    pub attendees: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub slots: Vec<(DateTime<Utc>, DateTime<Utc>)>,
    pub meeting_url: Option<String>,
    pub vote_reminder_minutes: Option<i32>,
    pub join_reminder_minutes: Option<i32>,
}

#[allow(dead_code)]
impl EventSpec {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            room_id: None,
            creator: "U-ORG".to_string(),
            attendees: Vec::new(),
            deadline: Utc::now() + Duration::days(1),
            slots: vec![hour_slot(10)],
            meeting_url: None,
            vote_reminder_minutes: None,
            join_reminder_minutes: None,
        }
    }

    pub fn room(mut self, room_id: &str) -> Self {
        self.room_id = Some(room_id.to_string());
        self
    }

    pub fn attendees(mut self, users: &[&str]) -> Self {
        self.attendees = users.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn slots(mut self, slots: Vec<(DateTime<Utc>, DateTime<Utc>)>) -> Self {
        self.slots = slots;
        self
    }

    fn into_request(self) -> NewEventRequest {
        NewEventRequest {
            title: self.title,
            project: None,
            room_id: self.room_id,
            location: None,
            meeting_url: self.meeting_url,
            required_attendees: self.attendees,
            deadline: self.deadline,
            slots: self.slots.into_iter().map(|(start, end)| CandidateSlot { start, end }).collect(),
            created_by: self.creator,
            vote_reminder_minutes: self.vote_reminder_minutes,
            join_reminder_minutes: self.join_reminder_minutes,
        }
    }
}

/// One-hour slot on a fixed future day, starting at `hour` UTC.
#[allow(dead_code)]
pub fn hour_slot(hour: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.with_ymd_and_hms(2031, 3, 10, hour, 0, 0).unwrap();
    (start, start + Duration::hours(1))
}
