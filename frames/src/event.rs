//! Typed events exchanged between participants and the coordinator.
//!
//! Every event travels as `{"event": <name>, "data": {..}}`. Payload field
//! names are camelCase. Canvas events map one-to-one onto
//! [`canvas::store::Mutation`]s so both sides apply exactly the same change.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use canvas::doc::{Element, ElementId, Point, StyleOptions, Tool, ToolSettings};
use canvas::store::{CanvasSnapshot, Mutation};
use serde::{Deserialize, Serialize};

/// Payload for events that only name a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub room_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoom {
    pub room_id: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_id: String,
    pub username: String,
}

/// A new element. The event carries the full style, so every receiver
/// builds an identical element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLine {
    pub room_id: String,
    pub id: ElementId,
    pub point: Point,
    pub tool: Tool,
    pub color: String,
    pub stroke_width: f64,
    pub opacity: f64,
    /// Absent for lines; rect, circle and text fall back to `color`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub is_temp: bool,
}

impl StartLine {
    /// Describe a freshly created element so a receiver can rebuild it.
    #[must_use]
    pub fn from_element(room_id: impl Into<String>, element: &Element) -> Self {
        let text = match &element.shape {
            canvas::doc::Shape::Text { text, .. } => Some(text.clone()),
            _ => None,
        };
        Self {
            room_id: room_id.into(),
            id: element.id.clone(),
            point: element.anchor(),
            tool: element.tool,
            color: element.color.clone(),
            stroke_width: element.stroke_width,
            opacity: element.opacity,
            stroke_color: element.stroke_color.clone(),
            text,
            is_temp: element.transient,
        }
    }

    /// Build the element this event describes. Depends on nothing but the
    /// event.
    #[must_use]
    pub fn to_element(&self) -> Element {
        let settings = ToolSettings {
            tool: self.tool,
            color: self.color.clone(),
            stroke_color: None,
            stroke_width: self.stroke_width,
            opacity: self.opacity,
        };
        let style = StyleOptions {
            stroke_color: self.stroke_color.clone(),
            text: self.text.clone(),
            transient: self.is_temp,
            ..StyleOptions::default()
        };
        Element::create(self.id.clone(), self.tool, self.point, &style, &settings)
    }
}

/// Payload for `draw-line` and `move-element`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPoint {
    pub room_id: String,
    pub id: ElementId,
    pub point: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChange {
    pub room_id: String,
    pub id: ElementId,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyMask {
    pub room_id: String,
    pub element_id: ElementId,
    pub eraser_lines: Vec<Vec<Point>>,
    #[serde(default)]
    pub stroke_widths: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveElement {
    pub room_id: String,
    #[serde(alias = "elementId")]
    pub id: ElementId,
}

/// Full canvas state for a participant that just joined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingCanvas {
    pub room_id: String,
    #[serde(flatten)]
    pub snapshot: CanvasSnapshot,
}

/// Public listing entry for a room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub preview: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPreview {
    pub room_id: String,
    pub preview: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    User,
    System,
}

/// One chat line. `time` is milliseconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    pub text: String,
    pub username: String,
    pub time: i64,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    pub room_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Every event on the channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum Event {
    CreateRoom(CreateRoom),
    JoinRoom(JoinRoom),
    StartLine(StartLine),
    DrawLine(ElementPoint),
    TextChange(TextChange),
    MoveElement(ElementPoint),
    ApplyMask(ApplyMask),
    RemoveElement(RemoveElement),
    Undo(RoomRef),
    Redo(RoomRef),
    #[serde(rename = "update-undoStack")]
    UpdateUndoStack(RoomRef),
    ResetCanvas(RoomRef),
    LoadingCanvas(LoadingCanvas),
    RoomNotFound(RoomRef),
    UpdateRooms(Vec<RoomSummary>),
    UpdateRoomPreview(RoomPreview),
    Message(ChatMessage),
    ChatHistory(ChatHistory),
    Error(ErrorPayload),
}

impl Event {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom(_) => "create-room",
            Self::JoinRoom(_) => "join-room",
            Self::StartLine(_) => "start-line",
            Self::DrawLine(_) => "draw-line",
            Self::TextChange(_) => "text-change",
            Self::MoveElement(_) => "move-element",
            Self::ApplyMask(_) => "apply-mask",
            Self::RemoveElement(_) => "remove-element",
            Self::Undo(_) => "undo",
            Self::Redo(_) => "redo",
            Self::UpdateUndoStack(_) => "update-undoStack",
            Self::ResetCanvas(_) => "reset-canvas",
            Self::LoadingCanvas(_) => "loading-canvas",
            Self::RoomNotFound(_) => "room-not-found",
            Self::UpdateRooms(_) => "update-rooms",
            Self::UpdateRoomPreview(_) => "update-room-preview",
            Self::Message(_) => "message",
            Self::ChatHistory(_) => "chat-history",
            Self::Error(_) => "error",
        }
    }

    /// The room this event is scoped to, if any.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::CreateRoom(CreateRoom { room_id, .. })
            | Self::JoinRoom(JoinRoom { room_id, .. })
            | Self::StartLine(StartLine { room_id, .. })
            | Self::DrawLine(ElementPoint { room_id, .. })
            | Self::MoveElement(ElementPoint { room_id, .. })
            | Self::TextChange(TextChange { room_id, .. })
            | Self::ApplyMask(ApplyMask { room_id, .. })
            | Self::RemoveElement(RemoveElement { room_id, .. })
            | Self::Undo(RoomRef { room_id })
            | Self::Redo(RoomRef { room_id })
            | Self::UpdateUndoStack(RoomRef { room_id })
            | Self::ResetCanvas(RoomRef { room_id })
            | Self::LoadingCanvas(LoadingCanvas { room_id, .. })
            | Self::RoomNotFound(RoomRef { room_id })
            | Self::UpdateRoomPreview(RoomPreview { room_id, .. })
            | Self::ChatHistory(ChatHistory { room_id, .. }) => Some(room_id),
            Self::Message(msg) => msg.room_id.as_deref(),
            Self::UpdateRooms(_) | Self::Error(_) => None,
        }
    }

    /// The canvas mutation this event carries, if it is a canvas event.
    #[must_use]
    pub fn to_mutation(&self) -> Option<Mutation> {
        let mutation = match self {
            Self::StartLine(start) => Mutation::Start(start.to_element()),
            Self::DrawLine(p) => Mutation::Extend { id: p.id.clone(), point: p.point },
            Self::TextChange(t) => Mutation::EditText { id: t.id.clone(), text: t.text.clone() },
            Self::MoveElement(p) => Mutation::Move { id: p.id.clone(), point: p.point },
            Self::ApplyMask(m) => Mutation::ApplyMask {
                id: m.element_id.clone(),
                strokes: m.eraser_lines.clone(),
                widths: m.stroke_widths.clone(),
            },
            Self::RemoveElement(r) => Mutation::Remove { id: r.id.clone() },
            Self::Undo(_) => Mutation::Undo,
            Self::Redo(_) => Mutation::Redo,
            Self::UpdateUndoStack(_) => Mutation::Checkpoint,
            Self::ResetCanvas(_) => Mutation::Reset,
            _ => return None,
        };
        Some(mutation)
    }

    /// The event announcing `mutation` in `room_id`.
    #[must_use]
    pub fn from_mutation(room_id: &str, mutation: &Mutation) -> Self {
        let room = || RoomRef { room_id: room_id.to_owned() };
        match mutation {
            Mutation::Start(element) => Self::StartLine(StartLine::from_element(room_id, element)),
            Mutation::Extend { id, point } => {
                Self::DrawLine(ElementPoint { room_id: room_id.to_owned(), id: id.clone(), point: *point })
            }
            Mutation::EditText { id, text } => {
                Self::TextChange(TextChange { room_id: room_id.to_owned(), id: id.clone(), text: text.clone() })
            }
            Mutation::Move { id, point } => {
                Self::MoveElement(ElementPoint { room_id: room_id.to_owned(), id: id.clone(), point: *point })
            }
            Mutation::ApplyMask { id, strokes, widths } => Self::ApplyMask(ApplyMask {
                room_id: room_id.to_owned(),
                element_id: id.clone(),
                eraser_lines: strokes.clone(),
                stroke_widths: widths.clone(),
            }),
            Mutation::Remove { id } => Self::RemoveElement(RemoveElement { room_id: room_id.to_owned(), id: id.clone() }),
            Mutation::Undo => Self::Undo(room()),
            Mutation::Redo => Self::Redo(room()),
            Mutation::Checkpoint => Self::UpdateUndoStack(room()),
            Mutation::Reset => Self::ResetCanvas(room()),
        }
    }

    /// Shorthand for an `error` event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload { message: message.into() })
    }
}
