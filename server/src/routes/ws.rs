//! WebSocket handler, one task per participant connection.
//!
//! DESIGN
//! ======
//! On upgrade, registers the connection in `ws_clients` and enters a
//! `select!` loop:
//! - Incoming client messages → decode → dispatch by event
//! - Events queued by peers, timers and services → encode → forward
//!
//! Handler functions validate, call into services, and return `Outcome`s.
//! The dispatch layer owns fan-out: replies go straight back to the sender,
//! room and global broadcasts go through the service queues. Canvas events
//! are the exception: the canvas service relays them under the same lock
//! that applies them.
//!
//! ENCODING
//! ========
//! A connection is answered in the encoding it last spoke: JSON text until
//! it sends a binary frame, protobuf after that, and back again.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register for global pushes
//! 2. `join-room` → attach, announce, receive `loading-canvas`
//! 3. Canvas/chat events → apply and fan out
//! 4. Close → detach, announce departure, unregister

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use frames::{
    ChatHistory, CodecError, CreateRoom, Encoding, Event, JoinRoom, LoadingCanvas, Payload, RoomPreview, RoomRef,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services;
use crate::services::chat::system_message;
use crate::services::room::RoomError;
use crate::state::{AppState, ClientTx};

// =============================================================================
// OUTCOME
// =============================================================================

/// What a handler wants delivered. Handlers never send directly.
#[derive(Debug)]
enum Outcome {
    /// Send to the originating connection only.
    Reply(Event),
    /// Send to every participant of the room, sender included.
    BroadcastRoom { room_id: String, event: Event },
    /// Send to every live connection.
    BroadcastAll(Event),
    /// Push the current public room listing to every live connection.
    RefreshRoomList,
}

/// Per-connection state owned by the connection task.
#[derive(Debug)]
struct Connection {
    client_id: Uuid,
    tx: ClientTx,
    room: Option<String>,
    encoding: Encoding,
}

impl Connection {
    fn new(client_id: Uuid, tx: ClientTx) -> Self {
        Self { client_id, tx, room: None, encoding: Encoding::Text }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<Event>(state.config.client_queue_capacity);
    state.ws_clients.write().await.insert(client_id, client_tx.clone());
    info!(%client_id, "ws: client connected");

    let mut conn = Connection::new(client_id, client_tx);

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                let decoded = match msg {
                    Message::Text(text) => {
                        conn.encoding = Encoding::Text;
                        frames::decode_text(text.as_str())
                    }
                    Message::Binary(bytes) => {
                        conn.encoding = Encoding::Binary;
                        frames::decode_binary(&bytes)
                    }
                    Message::Close(_) => break,
                    _ => continue,
                };
                let replies = process_inbound(&state, &mut conn, decoded).await;
                if send_all(&mut socket, &replies, conn.encoding).await.is_err() {
                    break;
                }
            }
            Some(event) = client_rx.recv() => {
                if send_event(&mut socket, &event, conn.encoding).await.is_err() {
                    break;
                }
            }
        }
    }

    leave_room(&state, &mut conn).await;
    state.ws_clients.write().await.remove(&client_id);
    info!(%client_id, "ws: client disconnected");
}

async fn send_all(socket: &mut WebSocket, events: &[Event], encoding: Encoding) -> Result<(), axum::Error> {
    for event in events {
        send_event(socket, event, encoding).await?;
    }
    Ok(())
}

async fn send_event(socket: &mut WebSocket, event: &Event, encoding: Encoding) -> Result<(), axum::Error> {
    let payload = match frames::encode(event, encoding) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(event = event.name(), error = %e, "ws: failed to encode event");
            return Ok(());
        }
    };
    debug!(event = event.name(), ?encoding, "ws: send event");
    let msg = match payload {
        Payload::Text(text) => Message::Text(text.into()),
        Payload::Binary(bytes) => Message::Binary(bytes.into()),
    };
    socket.send(msg).await
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Handle one decoded inbound message and return the events for the sender.
///
/// Kept free of socket I/O so tests can drive a connection with plain
/// channels.
async fn process_inbound(state: &AppState, conn: &mut Connection, decoded: Result<Event, CodecError>) -> Vec<Event> {
    let event = match decoded {
        Ok(event) => event,
        Err(e) => {
            warn!(client_id = %conn.client_id, error = %e, "ws: invalid inbound frame");
            return vec![Event::error(format!("invalid frame: {e}"))];
        }
    };
    debug!(client_id = %conn.client_id, event = event.name(), "ws: recv event");

    let outcomes = match event {
        Event::CreateRoom(req) => handle_create(state, &req).await,
        Event::JoinRoom(req) => handle_join(state, conn, req).await,
        Event::UpdateRoomPreview(req) => handle_preview(state, req).await,
        Event::Message(msg) => handle_message(state, conn, msg),
        Event::ChatHistory(req) => handle_history(state, req).await,
        Event::LoadingCanvas(_) | Event::RoomNotFound(_) | Event::UpdateRooms(_) | Event::Error(_) => {
            warn!(client_id = %conn.client_id, event = event.name(), "ws: server-only event from client");
            vec![Outcome::Reply(Event::error(format!("unexpected event: {}", event.name())))]
        }
        canvas_event => {
            services::canvas::apply_event(state, conn.client_id, &canvas_event).await;
            Vec::new()
        }
    };

    let mut replies = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Reply(event) => replies.push(event),
            Outcome::BroadcastRoom { room_id, event } => {
                services::room::broadcast(state, &room_id, &event, None).await;
            }
            Outcome::BroadcastAll(event) => services::room::broadcast_all(state, &event).await,
            Outcome::RefreshRoomList => services::room::broadcast_room_list(state).await,
        }
    }
    replies
}

// =============================================================================
// ROOM HANDLERS
// =============================================================================

async fn handle_create(state: &AppState, req: &CreateRoom) -> Vec<Outcome> {
    services::room::create_room(state, &req.room_id, req.is_private).await;
    vec![Outcome::RefreshRoomList]
}

async fn handle_join(state: &AppState, conn: &mut Connection, req: JoinRoom) -> Vec<Outcome> {
    if conn.room.as_deref().is_some_and(|current| current != req.room_id) {
        leave_room(state, conn).await;
    }

    match services::room::join_room(state, &req.room_id, conn.client_id, &req.username, conn.tx.clone()).await {
        Ok(snapshot) => {
            conn.room = Some(req.room_id.clone());

            let notice = system_message(&req.room_id, &req.username, format!("{} joined the chat", req.username));
            state.chat.append(&req.room_id, notice.clone());

            vec![
                Outcome::BroadcastRoom { room_id: req.room_id.clone(), event: Event::Message(notice) },
                Outcome::RefreshRoomList,
                Outcome::Reply(Event::LoadingCanvas(LoadingCanvas { room_id: req.room_id, snapshot })),
            ]
        }
        Err(RoomError::NotFound(room_id)) => {
            info!(client_id = %conn.client_id, %room_id, "ws: join of unknown room");
            vec![Outcome::Reply(Event::RoomNotFound(RoomRef { room_id }))]
        }
    }
}

/// Detach from the current room, if any, and tell the remaining participants.
async fn leave_room(state: &AppState, conn: &mut Connection) {
    let Some(room_id) = conn.room.take() else {
        return;
    };
    let Some(username) = services::room::part_room(state, &room_id, conn.client_id).await else {
        return;
    };

    let notice = system_message(&room_id, &username, format!("{username} left the chat"));
    state.chat.append(&room_id, notice.clone());
    services::room::broadcast(state, &room_id, &Event::Message(notice), None).await;
}

async fn handle_preview(state: &AppState, req: RoomPreview) -> Vec<Outcome> {
    if !services::room::set_preview(state, &req.room_id, &req.preview).await {
        debug!(room_id = %req.room_id, "ws: preview for unknown room dropped");
        return Vec::new();
    }
    vec![Outcome::BroadcastAll(Event::UpdateRoomPreview(req))]
}

// =============================================================================
// CHAT HANDLERS
// =============================================================================

fn handle_message(state: &AppState, conn: &Connection, mut msg: frames::ChatMessage) -> Vec<Outcome> {
    let Some(room_id) = msg.room_id.clone().or_else(|| conn.room.clone()) else {
        debug!(client_id = %conn.client_id, "ws: chat message without room dropped");
        return Vec::new();
    };
    msg.room_id = Some(room_id.clone());
    state.chat.append(&room_id, msg.clone());
    vec![Outcome::BroadcastRoom { room_id, event: Event::Message(msg) }]
}

async fn handle_history(state: &AppState, req: ChatHistory) -> Vec<Outcome> {
    let messages = state.chat.history(&req.room_id).await;
    vec![Outcome::Reply(Event::ChatHistory(ChatHistory { room_id: req.room_id, messages }))]
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
