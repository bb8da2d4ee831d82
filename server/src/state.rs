//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! cloned into every connection task and idle timer. It owns the room
//! registry: one `Room` per id, each holding its canvas, attached
//! participants, lifecycle flags and pending idle timer. Every canvas
//! mutation runs to completion under the registry write lock, which is what
//! makes each inbound event atomic.
//!
//! Outbound traffic never touches a socket directly. Each connection owns a
//! bounded `mpsc` queue of `Event`s; services push into it with `try_send`
//! and the connection task encodes and writes.

use std::collections::HashMap;
use std::sync::Arc;

use canvas::store::CanvasStore;
use frames::{Event, RoomSummary};
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::services::chat::ChatStore;

/// Sender half of a connection's outbound queue.
pub type ClientTx = mpsc::Sender<Event>;

// =============================================================================
// ROOM
// =============================================================================

/// A participant attached to a room.
#[derive(Debug, Clone)]
pub struct Participant {
    pub username: String,
    pub tx: ClientTx,
}

/// Per-room live state. Never persisted; inactive rooms keep everything.
pub struct Room {
    pub id: String,
    /// Display name, `Room N`.
    pub name: String,
    /// Creation order, used to list rooms oldest first.
    pub seq: usize,
    pub clients: HashMap<Uuid, Participant>,
    pub active: bool,
    pub private: bool,
    /// Opaque thumbnail supplied by participants, usually a data URL.
    pub preview: Option<String>,
    /// Pending deactivation, armed while the room is empty.
    pub idle_timer: Option<JoinHandle<()>>,
    pub canvas: CanvasStore,
}

impl Room {
    #[must_use]
    pub fn new(id: impl Into<String>, seq: usize, private: bool) -> Self {
        Self {
            id: id.into(),
            name: format!("Room {}", seq + 1),
            seq,
            clients: HashMap::new(),
            active: true,
            private,
            preview: None,
            idle_timer: None,
            canvas: CanvasStore::new(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> RoomSummary {
        RoomSummary { id: self.id.clone(), name: self.name.clone(), preview: self.preview.clone() }
    }

    /// Whether the room appears in the public listing.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.active && !self.private
    }

    /// Abort the pending idle timer, if any.
    pub fn cancel_idle_timer(&mut self) {
        if let Some(timer) = self.idle_timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.cancel_idle_timer();
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; every field is
/// Arc-wrapped or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, Room>>>,
    /// Every live connection, joined to a room or not. Used for listing pushes.
    pub ws_clients: Arc<RwLock<HashMap<Uuid, ClientTx>>>,
    pub chat: ChatStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, chat: ChatStore) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            ws_clients: Arc::new(RwLock::new(HashMap::new())),
            chat,
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
