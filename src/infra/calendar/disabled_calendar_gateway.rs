use crate::domain::ports::{CalendarEntry, CalendarGateway, NewCalendarEntry};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Stand-in used when no external calendar is configured.
pub struct DisabledCalendarGateway;

#[async_trait]
impl CalendarGateway for DisabledCalendarGateway {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn find_in_window(&self, _calendar_id: &str, _start: DateTime<Utc>, _end: DateTime<Utc>) -> Result<Vec<CalendarEntry>, AppError> {
        Ok(Vec::new())
    }

    async fn create_entry(&self, _calendar_id: &str, _entry: &NewCalendarEntry) -> Result<String, AppError> {
        Err(AppError::External("External calendar is not configured".into()))
    }

    async fn delete_entry(&self, _calendar_id: &str, _entry_id: &str) -> Result<(), AppError> {
        Ok(())
    }
}
