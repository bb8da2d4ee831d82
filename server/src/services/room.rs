//! Room service: lifecycle, membership and fan-out.
//!
//! DESIGN
//! ======
//! Rooms live in `AppState::rooms` for the life of the process. A room is
//! `active` while anyone is attached or its idle timer has not yet fired;
//! inactive rooms keep their canvas and can be joined again, which
//! reactivates them. Only active public rooms are listed.
//!
//! IDLE TIMER
//! ==========
//! Arming always replaces the previous timer. The timer task re-checks
//! emptiness under the write lock before deactivating, so a join that
//! races the expiry wins.
//!
//! FAN-OUT
//! =======
//! Delivery is `try_send` into each connection's bounded queue. A full
//! queue drops the event for that peer only.

use canvas::store::CanvasSnapshot;
use frames::{Event, RoomSummary};
use tracing::{debug, info};
use uuid::Uuid;

use crate::services::ErrorCode;
use crate::state::{AppState, ClientTx, Participant, Room};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room not found: {0}")]
    NotFound(String),
}

impl ErrorCode for RoomError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_ROOM_NOT_FOUND",
        }
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Register `room_id`, or reactivate it if it already exists. Returns
/// whether a new room was created. The idle timer is armed whenever the
/// room has nobody attached.
pub async fn create_room(state: &AppState, room_id: &str, private: bool) -> bool {
    let mut rooms = state.rooms.write().await;
    let created = !rooms.contains_key(room_id);
    let seq = rooms.len();
    let room = rooms.entry(room_id.to_owned()).or_insert_with(|| Room::new(room_id, seq, private));
    room.active = true;
    if room.clients.is_empty() {
        arm_idle_timer(state, room);
    }
    info!(%room_id, created, private = room.private, "room: create");
    created
}

/// Attach a participant. Cancels any pending idle timer and reactivates the
/// room. Returns the canvas state the joiner should load.
///
/// # Errors
///
/// Returns [`RoomError::NotFound`] if no room has this id.
pub async fn join_room(
    state: &AppState,
    room_id: &str,
    client_id: Uuid,
    username: &str,
    tx: ClientTx,
) -> Result<CanvasSnapshot, RoomError> {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_id) else {
        return Err(RoomError::NotFound(room_id.to_owned()));
    };

    room.cancel_idle_timer();
    room.active = true;
    room.clients.insert(client_id, Participant { username: username.to_owned(), tx });
    info!(%room_id, %client_id, %username, clients = room.clients.len(), "room: join");
    Ok(room.canvas.snapshot())
}

/// Detach a participant. Arms the idle timer when the room becomes empty.
/// Returns the participant's username if they were attached.
pub async fn part_room(state: &AppState, room_id: &str, client_id: Uuid) -> Option<String> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(room_id)?;
    let participant = room.clients.remove(&client_id)?;

    info!(%room_id, %client_id, remaining = room.clients.len(), "room: part");
    if room.clients.is_empty() {
        arm_idle_timer(state, room);
    }
    Some(participant.username)
}

/// Replace `room`'s idle timer with a fresh one. Caller holds the write lock.
pub fn arm_idle_timer(state: &AppState, room: &mut Room) {
    room.cancel_idle_timer();
    let timeout = state.config.room_idle_timeout;
    let task_state = state.clone();
    let room_id = room.id.clone();
    room.idle_timer = Some(tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        expire_room(&task_state, &room_id).await;
    }));
    debug!(room_id = %room.id, ?timeout, "room: idle timer armed");
}

/// Deactivate `room_id` if it is still empty and push the new listing to
/// every connection. Returns whether the room was deactivated.
pub async fn expire_room(state: &AppState, room_id: &str) -> bool {
    {
        let mut rooms = state.rooms.write().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return false;
        };
        if !room.clients.is_empty() {
            return false;
        }
        // Detach without aborting: this may be the timer task itself.
        room.idle_timer = None;
        room.active = false;
    }
    info!(%room_id, "room: inactive");
    broadcast_room_list(state).await;
    true
}

// =============================================================================
// QUERIES
// =============================================================================

/// Active public rooms, oldest first.
pub async fn list_visible(state: &AppState) -> Vec<RoomSummary> {
    let rooms = state.rooms.read().await;
    let mut visible: Vec<&Room> = rooms.values().filter(|r| r.is_visible()).collect();
    visible.sort_by_key(|r| r.seq);
    visible.into_iter().map(Room::summary).collect()
}

/// Summaries for those of `ids` that exist, regardless of visibility.
pub async fn check_rooms(state: &AppState, ids: &[String]) -> Vec<RoomSummary> {
    let rooms = state.rooms.read().await;
    let mut found: Vec<&Room> = ids.iter().filter_map(|id| rooms.get(id)).collect();
    found.sort_by_key(|r| r.seq);
    found.dedup_by_key(|r| r.seq);
    found.into_iter().map(Room::summary).collect()
}

pub async fn room_exists(state: &AppState, room_id: &str) -> bool {
    state.rooms.read().await.contains_key(room_id)
}

/// Store a participant-supplied thumbnail. Returns false for unknown rooms.
pub async fn set_preview(state: &AppState, room_id: &str, preview: &str) -> bool {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_id) else {
        return false;
    };
    room.preview = Some(preview.to_owned());
    true
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Queue `event` to every participant of an already-locked room.
pub fn relay(room: &Room, event: &Event, exclude: Option<Uuid>) {
    for (client_id, participant) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        if participant.tx.try_send(event.clone()).is_err() {
            debug!(room_id = %room.id, %client_id, event = event.name(), "room: peer queue full, dropped");
        }
    }
}

/// Queue `event` to every participant of `room_id`, optionally excluding one.
pub async fn broadcast(state: &AppState, room_id: &str, event: &Event, exclude: Option<Uuid>) {
    let rooms = state.rooms.read().await;
    if let Some(room) = rooms.get(room_id) {
        relay(room, event, exclude);
    }
}

/// Queue `event` to every live connection, joined to a room or not.
pub async fn broadcast_all(state: &AppState, event: &Event) {
    let clients = state.ws_clients.read().await;
    for (client_id, tx) in clients.iter() {
        if tx.try_send(event.clone()).is_err() {
            debug!(%client_id, event = event.name(), "room: client queue full, dropped");
        }
    }
}

/// Push the current public listing to every connection.
pub async fn broadcast_room_list(state: &AppState) {
    let listing = Event::UpdateRooms(list_visible(state).await);
    broadcast_all(state, &listing).await;
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
