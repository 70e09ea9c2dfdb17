use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{CalendarGateway, ChatNotifier};
use crate::error::AppError;
use crate::state::{AppState, Repositories};
use crate::infra::calendar::{disabled_calendar_gateway::DisabledCalendarGateway, http_calendar_gateway::HttpCalendarGateway};
use crate::infra::chat::slack_notifier::SlackNotifier;
use crate::infra::repositories::{
    postgres_attendance_repo::PostgresAttendanceRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_event_repo::PostgresEventRepo, postgres_reminder_repo::PostgresReminderRepo,
    postgres_room_repo::PostgresRoomRepo, postgres_vote_repo::PostgresVoteRepo,
    sqlite_attendance_repo::SqliteAttendanceRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_reminder_repo::SqliteReminderRepo,
    sqlite_room_repo::SqliteRoomRepo, sqlite_vote_repo::SqliteVoteRepo,
};

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let database_url = &config.database_url;

    let notifier: Arc<dyn ChatNotifier> = Arc::new(SlackNotifier::new(
        config.chat_api_url.clone(),
        config.chat_api_token.clone(),
    ));

    let gateway: Arc<dyn CalendarGateway> = match &config.calendar_api_url {
        Some(url) => {
            info!("External calendar enabled at {}", url);
            Arc::new(HttpCalendarGateway::new(url.clone(), config.calendar_api_token.clone()))
        }
        None => {
            warn!("CALENDAR_API_URL not set, calendar reflection disabled");
            Arc::new(DisabledCalendarGateway)
        }
    };

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");
        let pool = connect_postgres(database_url).await?;
        postgres_repositories(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");
        let pool = connect_sqlite(database_url).await?;
        sqlite_repositories(pool)
    };

    Ok(AppState::assemble(config.clone(), repos, notifier, gateway))
}

pub async fn connect_postgres(database_url: &str) -> Result<PgPool, AppError> {
    let opts: PgConnectOptions = database_url.parse()?;
    let opts = opts.log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(opts)
        .await?;

    sqlx::migrate!("./migrations/postgres")
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to run Postgres migrations: {}", e)))?;

    Ok(pool)
}

pub async fn connect_sqlite(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    sqlx::migrate!("./migrations/sqlite")
        .run(&pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to run SQLite migrations: {}", e)))?;

    Ok(pool)
}

pub fn sqlite_repositories(pool: SqlitePool) -> Repositories {
    Repositories {
        rooms: Arc::new(SqliteRoomRepo::new(pool.clone())),
        events: Arc::new(SqliteEventRepo::new(pool.clone())),
        votes: Arc::new(SqliteVoteRepo::new(pool.clone())),
        bookings: Arc::new(SqliteBookingRepo::new(pool.clone())),
        attendance: Arc::new(SqliteAttendanceRepo::new(pool.clone())),
        reminders: Arc::new(SqliteReminderRepo::new(pool)),
    }
}

pub fn postgres_repositories(pool: PgPool) -> Repositories {
    Repositories {
        rooms: Arc::new(PostgresRoomRepo::new(pool.clone())),
        events: Arc::new(PostgresEventRepo::new(pool.clone())),
        votes: Arc::new(PostgresVoteRepo::new(pool.clone())),
        bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
        attendance: Arc::new(PostgresAttendanceRepo::new(pool.clone())),
        reminders: Arc::new(PostgresReminderRepo::new(pool)),
    }
}
