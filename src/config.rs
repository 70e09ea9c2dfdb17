use std::env;
use chrono_tz::Tz;
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub chat_api_url: String,
    pub chat_api_token: String,
    pub chat_channel: String,
    /// Unset disables the external calendar reflector.
    pub calendar_api_url: Option<String>,
    pub calendar_api_token: String,
    pub calendar_id: String,
    pub scheduler_interval_secs: u64,
    pub scheduler_batch_size: i64,
    pub default_vote_reminder_minutes: i64,
    pub default_join_reminder_minutes: i64,
    pub display_timezone: Tz,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Validation("DATABASE_URL must be set".into()))?;

        let display_timezone = env::var("DISPLAY_TIMEZONE").unwrap_or_else(|_| "Asia/Tokyo".to_string());
        let display_timezone: Tz = display_timezone.parse()
            .map_err(|_| AppError::Validation(format!("Invalid DISPLAY_TIMEZONE: {}", display_timezone)))?;

        Ok(Self {
            database_url,
            port: parse_var("PORT", 3000)?,
            chat_api_url: env::var("CHAT_API_URL").unwrap_or_else(|_| "https://slack.com/api".to_string()),
            chat_api_token: env::var("CHAT_API_TOKEN").unwrap_or_default(),
            chat_channel: env::var("CHAT_CHANNEL").unwrap_or_else(|_| "general".to_string()),
            calendar_api_url: env::var("CALENDAR_API_URL").ok().filter(|v| !v.is_empty()),
            calendar_api_token: env::var("CALENDAR_API_TOKEN").unwrap_or_default(),
            calendar_id: env::var("CALENDAR_ID").unwrap_or_else(|_| "primary".to_string()),
            scheduler_interval_secs: parse_var("SCHEDULER_INTERVAL_SECS", 600)?,
            scheduler_batch_size: parse_var("SCHEDULER_BATCH_SIZE", 10)?,
            default_vote_reminder_minutes: parse_var("DEFAULT_VOTE_REMINDER_MINUTES", 60)?,
            default_join_reminder_minutes: parse_var("DEFAULT_JOIN_REMINDER_MINUTES", 10)?,
            display_timezone,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw.parse()
            .map_err(|_| AppError::Validation(format!("{} must be a number", name))),
        Err(_) => Ok(default),
    }
}
