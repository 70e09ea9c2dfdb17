use axum::{extract::State, Json};
use std::sync::Arc;
use crate::api::dtos::responses::HealthResponse;
use crate::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        calendar_enabled: state.calendar.is_enabled(),
    })
}
