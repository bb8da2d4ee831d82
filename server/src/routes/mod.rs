//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the room listing endpoints, the chat transcript
//! endpoint and the websocket upgrade. All routes share `AppState`, allow
//! any origin, and are traced per request.

pub mod rooms;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/rooms", get(rooms::list_rooms))
        .route("/api/rooms/check", post(rooms::check_rooms))
        .route("/api/rooms/{id}/chat", get(rooms::chat_history))
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
