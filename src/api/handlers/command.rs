use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::info;
use crate::domain::models::command::{Command, CommandReply};
use crate::error::AppError;
use crate::state::AppState;

/// Inbound adapter for chat interactions, already decoded into commands.
pub async fn handle_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> Result<impl IntoResponse, AppError> {
    info!("Dispatching command: {}", command_name(&command));

    let reply = state.dispatcher.dispatch(command).await?;
    let status = match reply {
        CommandReply::EventCreated { .. } => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(reply)))
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::NewEventRequested(_) => "new_event_requested",
        Command::VoteCast { .. } => "vote_cast",
        Command::StatusRequested { .. } => "status_requested",
        Command::CloseRequested { .. } => "close_requested",
        Command::CancelRequested { .. } => "cancel_requested",
    }
}
