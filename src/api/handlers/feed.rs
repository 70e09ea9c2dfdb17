use axum::{extract::State, http::header, response::IntoResponse};
use std::sync::Arc;
use tracing::debug;
use crate::domain::services::calendar::generate_feed;
use crate::error::AppError;
use crate::state::AppState;

pub async fn calendar_feed(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_confirmed().await?;
    debug!("Rendering calendar feed with {} bookings", bookings.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        generate_feed(&bookings),
    ))
}
