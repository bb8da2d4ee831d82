//! Room listing and chat transcript routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use frames::{ChatMessage, RoomSummary};
use serde::Deserialize;

use crate::services::room::{self, RoomError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckRoomsBody {
    #[serde(default)]
    pub ids: Vec<String>,
}

/// `GET /api/rooms`: active public rooms.
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(room::list_visible(&state).await)
}

/// `POST /api/rooms/check`: which of the given ids exist.
pub async fn check_rooms(State(state): State<AppState>, Json(body): Json<CheckRoomsBody>) -> Json<Vec<RoomSummary>> {
    Json(room::check_rooms(&state, &body.ids).await)
}

/// `GET /api/rooms/{id}/chat`: the room's chat transcript.
pub async fn chat_history(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, StatusCode> {
    if !room::room_exists(&state, &room_id).await {
        return Err(room_error_to_status(&RoomError::NotFound(room_id)));
    }
    Ok(Json(state.chat.history(&room_id).await))
}

pub(crate) fn room_error_to_status(err: &RoomError) -> StatusCode {
    match err {
        RoomError::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
