use axum::{extract::{Query, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use crate::api::dtos::{
    requests::{CreateRoomRequest, ScheduleQuery},
    responses::{BusyResponse, ScheduleResponse},
};
use crate::domain::models::room::Room;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Room name must not be empty".into()));
    }
    if payload.capacity.is_some_and(|c| c < 0) {
        return Err(AppError::Validation("Capacity must not be negative".into()));
    }

    let room = Room::new(name.to_string(), payload.capacity, payload.calendar_ref);
    let created = state.room_repo.create(&room).await?;
    info!("Room {} registered with capacity {:?}", created.name, created.capacity);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(state.room_repo.list().await?))
}

pub async fn busy_now(State(state): State<Arc<AppState>>) -> Result<Json<BusyResponse>, AppError> {
    let now = Utc::now();
    let rooms = state.availability.busy_now(now).await?;
    Ok(Json(BusyResponse {
        now,
        timezone: state.config.display_timezone.name().to_string(),
        rooms,
    }))
}

pub async fn schedule(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let to = query.to.unwrap_or(query.from);
    let rooms = state.availability.schedule(query.from, to).await?;
    Ok(Json(ScheduleResponse {
        timezone: state.config.display_timezone.name().to_string(),
        rooms,
    }))
}
