use axum::{extract::{Path, State}, Json};
use std::sync::Arc;
use crate::domain::models::command::EventStatusView;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<EventStatusView>, AppError> {
    Ok(Json(state.dispatcher.status(&event_id).await?))
}
