//! Canvas service: apply a participant's edit to the room and relay it.
//!
//! The mutation and the relay happen under one registry write lock, so every
//! participant observes edits in the same order the room applied them.

use frames::Event;
use tracing::debug;
use uuid::Uuid;

use crate::services::room;
use crate::state::AppState;

/// What happened to an inbound canvas event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Stored and relayed. `changed` is false for no-ops such as an unknown
    /// element id or an empty undo stack.
    Stored { changed: bool },
    /// Transient element: relayed only.
    Relayed,
    /// Room unknown, event dropped.
    Dropped,
    /// Not a canvas event.
    Ignored,
}

/// Apply `event` from `client_id` to the room it names and relay it
/// verbatim to every other participant of that room.
pub async fn apply_event(state: &AppState, client_id: Uuid, event: &Event) -> Applied {
    let Some(mutation) = event.to_mutation() else {
        return Applied::Ignored;
    };
    let Some(room_id) = event.room_id() else {
        return Applied::Ignored;
    };

    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_id) else {
        debug!(%room_id, %client_id, event = event.name(), "canvas: unknown room, dropped");
        return Applied::Dropped;
    };

    let outcome = if mutation.is_transient() {
        Applied::Relayed
    } else {
        Applied::Stored { changed: room.canvas.apply(&mutation) }
    };
    room::relay(room, event, Some(client_id));
    debug!(%room_id, %client_id, event = event.name(), ?outcome, "canvas: applied");
    outcome
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
