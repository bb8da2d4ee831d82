//! Gesture handling for one participant.
//!
//! SYSTEM CONTEXT
//! ==============
//! A UI reports raw pointer and keyboard input to [`Session`]; the session
//! decides what it means for the current tool, applies the resulting edits
//! to the local mirror, and returns the events to send, in order.
//!
//! GESTURES
//! ========
//! - drawing tools: pointer-down starts an element, moves extend it
//! - select: pointer-down on an element records an undo checkpoint, moves
//!   drag it (one `move-element` per step)
//! - eraser: delegated to [`EraserGesture`]
//! - text: placed and edited explicitly, not by pointer gestures

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use canvas::consts::ERASE_THRESHOLD;
use canvas::doc::{Element, ElementId, Point, StyleOptions, Tool};
use canvas::geometry::hit_test;
use canvas::input::EraserGesture;
use canvas::store::Mutation;
use frames::Event;
use uuid::Uuid;

use crate::mirror::LocalMirror;

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Drawing {
        id: ElementId,
    },
    Dragging {
        id: ElementId,
        /// Anchor minus grab point, kept for the whole drag.
        offset: (f64, f64),
    },
    Erasing,
}

#[derive(Debug, Clone)]
pub struct Session {
    mirror: LocalMirror,
    eraser: EraserGesture,
    gesture: Gesture,
}

impl Session {
    #[must_use]
    pub fn new(room_id: impl Into<String>) -> Self {
        Self::with_mirror(LocalMirror::new(room_id))
    }

    #[must_use]
    pub fn with_mirror(mirror: LocalMirror) -> Self {
        Self { mirror, eraser: EraserGesture::new(), gesture: Gesture::Idle }
    }

    #[must_use]
    pub fn mirror(&self) -> &LocalMirror {
        &self.mirror
    }

    pub fn mirror_mut(&mut self) -> &mut LocalMirror {
        &mut self.mirror
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.mirror.settings_mut().tool = tool;
    }

    /// Whether a pointer gesture is in progress.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    // =========================================================================
    // POINTER
    // =========================================================================

    pub fn pointer_down(&mut self, point: Point) -> Vec<Event> {
        let settings = self.mirror.settings().clone();
        match settings.tool {
            Tool::Eraser => {
                self.gesture = Gesture::Erasing;
                let mutations = self.eraser.pointer_down(new_id(), point, &settings);
                self.apply_all(&mutations)
            }
            Tool::Select => {
                let Some((id, anchor)) = self.element_at(point).map(|el| (el.id.clone(), el.anchor())) else {
                    return Vec::new();
                };
                self.gesture = Gesture::Dragging { id, offset: (anchor.x - point.x, anchor.y - point.y) };
                vec![self.mirror.apply_local(&Mutation::Checkpoint)]
            }
            Tool::Text => Vec::new(),
            tool => {
                let element = Element::create(new_id(), tool, point, &StyleOptions::default(), &settings);
                self.gesture = Gesture::Drawing { id: element.id.clone() };
                vec![self.mirror.apply_local(&Mutation::Start(element))]
            }
        }
    }

    pub fn pointer_move(&mut self, point: Point) -> Vec<Event> {
        match &self.gesture {
            Gesture::Idle => Vec::new(),
            Gesture::Drawing { id } => {
                let mutation = Mutation::Extend { id: id.clone(), point };
                vec![self.mirror.apply_local(&mutation)]
            }
            Gesture::Dragging { id, offset } => {
                let mutation = Mutation::Move { id: id.clone(), point: point.offset(offset.0, offset.1) };
                vec![self.mirror.apply_local(&mutation)]
            }
            Gesture::Erasing => {
                let mutations = self.eraser.pointer_move(point, self.mirror.elements());
                mutations.iter().map(|m| self.mirror.apply_local(m)).collect()
            }
        }
    }

    pub fn pointer_up(&mut self) -> Vec<Event> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Erasing => {
                let mutations = self.eraser.pointer_up();
                self.apply_all(&mutations)
            }
            Gesture::Idle | Gesture::Drawing { .. } | Gesture::Dragging { .. } => Vec::new(),
        }
    }

    // =========================================================================
    // TEXT
    // =========================================================================

    /// Place a new text element at `point`. Returns its id and the event.
    pub fn place_text(&mut self, point: Point, text: &str) -> (ElementId, Event) {
        let style = StyleOptions { text: Some(text.to_owned()), ..StyleOptions::default() };
        let element = Element::create(new_id(), Tool::Text, point, &style, self.mirror.settings());
        let id = element.id.clone();
        (id, self.mirror.apply_local(&Mutation::Start(element)))
    }

    pub fn edit_text(&mut self, id: &str, text: &str) -> Event {
        self.mirror.apply_local(&Mutation::EditText { id: id.to_owned(), text: text.to_owned() })
    }

    // =========================================================================
    // HISTORY
    // =========================================================================

    pub fn undo(&mut self) -> Event {
        self.mirror.apply_local(&Mutation::Undo)
    }

    pub fn redo(&mut self) -> Event {
        self.mirror.apply_local(&Mutation::Redo)
    }

    pub fn reset(&mut self) -> Event {
        self.mirror.apply_local(&Mutation::Reset)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Topmost persistent element under `point`.
    fn element_at(&self, point: Point) -> Option<&Element> {
        self.mirror
            .elements()
            .iter()
            .rev()
            .find(|el| !el.transient && hit_test(&[point], el, ERASE_THRESHOLD))
    }

    fn apply_all(&mut self, mutations: &[Mutation]) -> Vec<Event> {
        mutations.iter().map(|m| self.mirror.apply_local(m)).collect()
    }
}

fn new_id() -> ElementId {
    Uuid::new_v4().to_string()
}
