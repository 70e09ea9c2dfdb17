use crate::domain::ports::{CalendarEntry, CalendarGateway, NewCalendarEntry};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// REST calendar client (Google Calendar v3 resource layout).
pub struct HttpCalendarGateway {
    client: Client,
    api_url: String,
    token: String,
}

impl HttpCalendarGateway {
    pub fn new(api_url: String, token: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            token,
        }
    }

    fn events_url(&self, calendar_id: &str, entry_id: Option<&str>) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid CALENDAR_API_URL: {}", e)))?;
        {
            let mut segments = url.path_segments_mut()
                .map_err(|_| AppError::InternalWithMsg("CALENDAR_API_URL cannot be a base URL".into()))?;
            segments.pop_if_empty().push("calendars").push(calendar_id).push("events");
            if let Some(id) = entry_id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

fn connection_error(e: reqwest::Error) -> AppError {
    let msg = format!("Calendar API connection error: {}", e);
    error!("{}", msg);
    AppError::External(msg)
}

async fn ensure_success(res: reqwest::Response, action: &str) -> Result<reqwest::Response, AppError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    Err(AppError::External(format!("Calendar {} failed. Status: {}, Body: {}", action, status, text)))
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct EventResource {
    id: String,
    summary: Option<String>,
    start: EventTime,
    end: EventTime,
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventResource>,
}

#[derive(Serialize)]
struct EventInsert<'a> {
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    start: EventTime,
    end: EventTime,
}

#[async_trait]
impl CalendarGateway for HttpCalendarGateway {
    async fn find_in_window(&self, calendar_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<CalendarEntry>, AppError> {
        let url = self.events_url(calendar_id, None)?;
        let res = self.client.get(url)
            .bearer_auth(&self.token)
            .query(&[
                ("timeMin", start.to_rfc3339()),
                ("timeMax", end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
            ])
            .send()
            .await
            .map_err(connection_error)?;

        let list: EventList = ensure_success(res, "search").await?
            .json().await
            .map_err(|e| AppError::External(format!("Calendar search returned malformed JSON: {}", e)))?;

        // All-day entries carry no dateTime and can never match a timed window.
        Ok(list.items.into_iter()
            .filter_map(|item| match (item.start.date_time, item.end.date_time) {
                (Some(start), Some(end)) => Some(CalendarEntry { id: item.id, summary: item.summary, start, end }),
                _ => None,
            })
            .collect())
    }

    async fn create_entry(&self, calendar_id: &str, entry: &NewCalendarEntry) -> Result<String, AppError> {
        let url = self.events_url(calendar_id, None)?;
        let payload = EventInsert {
            summary: &entry.summary,
            description: entry.description.as_deref(),
            location: entry.location.as_deref(),
            start: EventTime { date_time: Some(entry.start) },
            end: EventTime { date_time: Some(entry.end) },
        };

        let res = self.client.post(url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(connection_error)?;

        let created: EventResource = ensure_success(res, "insert").await?
            .json().await
            .map_err(|e| AppError::External(format!("Calendar insert returned malformed JSON: {}", e)))?;
        Ok(created.id)
    }

    async fn delete_entry(&self, calendar_id: &str, entry_id: &str) -> Result<(), AppError> {
        let url = self.events_url(calendar_id, Some(entry_id))?;
        let res = self.client.delete(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(connection_error)?;

        if matches!(res.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            info!("Calendar entry {} was already removed", entry_id);
            return Ok(());
        }
        ensure_success(res, "delete").await?;
        Ok(())
    }
}
