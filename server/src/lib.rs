//! inkroom coordinator: room registry, event relay and chat transcripts
//! behind one Axum router.
//!
//! The binary in `main.rs` only loads configuration and calls [`serve`];
//! integration tests bind the same router to an ephemeral port.

pub mod config;
pub mod routes;
pub mod services;
pub mod state;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::services::chat::ChatStore;
use crate::state::AppState;

/// Build the shared state for `config`, starting the chat writer.
#[must_use]
pub fn build_state(config: ServerConfig) -> AppState {
    let (chat, _writer) = ChatStore::spawn(config.chat_dir.clone());
    AppState::new(config, chat)
}

/// Serve the application on an already-bound listener until it fails.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, routes::app(state)).await
}
