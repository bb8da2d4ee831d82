//! Per-room element list with snapshot undo/redo.
//!
//! DESIGN
//! ======
//! `CanvasStore` is a plain value: the coordinator keeps one per room behind
//! its registry lock and every participant keeps one as its local mirror.
//! Applying the same [`Mutation`] sequence to two stores yields equal stores.
//!
//! Undo history is a stack of full deep copies of the element list. A
//! snapshot is taken before every structural edit (start, move, mask,
//! checkpoint, reset); in-progress edits (extend, text change) and removals
//! take none, so one gesture is one undo step. Transient elements are never
//! captured.
//!
//! Unknown element ids are silent no-ops that leave the stacks untouched.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_MASK_WIDTH;
use crate::doc::{Element, MaskLine, Point, Shape};
use crate::geometry::translate_to;

/// One state-changing operation on a room canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Start(Element),
    Extend { id: String, point: Point },
    EditText { id: String, text: String },
    Move { id: String, point: Point },
    ApplyMask { id: String, strokes: Vec<Vec<Point>>, widths: Vec<f64> },
    Remove { id: String },
    Undo,
    Redo,
    Checkpoint,
    Reset,
}

impl Mutation {
    /// Whether this is the start of a transient element.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Start(el) if el.transient)
    }
}

/// Full store contents, as sent to a late joiner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSnapshot {
    pub elements: Vec<Element>,
    #[serde(default)]
    pub undo_stack: Vec<Vec<Element>>,
    #[serde(default)]
    pub redo_stack: Vec<Vec<Element>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanvasStore {
    elements: Vec<Element>,
    undo: Vec<Vec<Element>>,
    redo: Vec<Vec<Element>>,
}

impl CanvasStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: CanvasSnapshot) -> Self {
        Self { elements: snapshot.elements, undo: snapshot.undo_stack, redo: snapshot.redo_stack }
    }

    // --- Queries ---

    /// Elements in z-order (first drawn first).
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|el| el.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    // --- Snapshots ---

    /// Export everything, stacks included.
    #[must_use]
    pub fn snapshot(&self) -> CanvasSnapshot {
        CanvasSnapshot { elements: self.elements.clone(), undo_stack: self.undo.clone(), redo_stack: self.redo.clone() }
    }

    /// Replace everything with `snapshot`.
    pub fn hydrate(&mut self, snapshot: CanvasSnapshot) {
        *self = Self::from_snapshot(snapshot);
    }

    fn capture(&self) -> Vec<Element> {
        self.elements.iter().filter(|el| !el.transient).cloned().collect()
    }

    /// Push the pre-mutation state and invalidate redo.
    fn record(&mut self) {
        let snapshot = self.capture();
        self.undo.push(snapshot);
        self.redo.clear();
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|el| el.id == id)
    }

    // --- Operations ---

    /// Append a new element. Non-transient starts are undoable.
    pub fn start_element(&mut self, element: Element) -> bool {
        if !element.transient {
            self.record();
        }
        self.elements.push(element);
        true
    }

    /// Grow an in-progress element toward `point`: lines append it, rects
    /// move their end corner, circles take the distance as radius. Text is
    /// unaffected.
    pub fn extend_element(&mut self, id: &str, point: Point) -> bool {
        let Some(el) = self.find_mut(id) else {
            return false;
        };
        match &mut el.shape {
            Shape::Line { points } => points.push(point),
            Shape::Rect { end, .. } => *end = point,
            Shape::Circle { center, radius } => *radius = center.distance(point),
            Shape::Text { .. } => return false,
        }
        true
    }

    /// Replace the content of a text element.
    pub fn edit_text(&mut self, id: &str, text: &str) -> bool {
        match self.find_mut(id).map(|el| &mut el.shape) {
            Some(Shape::Text { text: current, .. }) => {
                text.clone_into(current);
                true
            }
            _ => false,
        }
    }

    /// Translate an element (and its mask) so its anchor lands on `anchor`.
    pub fn move_element(&mut self, id: &str, anchor: Point) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.record();
        self.find_mut(id).is_some_and(|el| {
            translate_to(el, anchor);
            true
        })
    }

    /// Append erase strokes to an element's mask. Strokes are paired with
    /// `widths` by index; missing widths default to 2.
    pub fn apply_mask(&mut self, id: &str, strokes: &[Vec<Point>], widths: &[f64]) -> bool {
        if strokes.is_empty() || self.get(id).is_none() {
            return false;
        }
        self.record();
        let Some(el) = self.find_mut(id) else {
            return false;
        };
        let mask = el.mask.get_or_insert_default();
        for (i, stroke) in strokes.iter().enumerate() {
            let stroke_width = widths.get(i).copied().unwrap_or(DEFAULT_MASK_WIDTH);
            mask.lines.push(MaskLine { points: stroke.clone(), stroke_width });
        }
        true
    }

    /// Drop an element. Not undoable on its own.
    pub fn remove_element(&mut self, id: &str) -> bool {
        let before = self.elements.len();
        self.elements.retain(|el| el.id != id);
        self.elements.len() != before
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.elements, previous);
        self.redo.push(current.into_iter().filter(|el| !el.transient).collect());
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.elements, next);
        self.undo.push(current.into_iter().filter(|el| !el.transient).collect());
        true
    }

    /// Record an undo step without changing anything visible. Sent when a
    /// drag begins so the whole drag undoes as one.
    pub fn checkpoint(&mut self) -> bool {
        self.record();
        true
    }

    /// Clear the canvas. Undoable.
    pub fn reset(&mut self) -> bool {
        self.record();
        self.elements.clear();
        true
    }

    /// Apply one mutation. Returns whether anything changed.
    pub fn apply(&mut self, mutation: &Mutation) -> bool {
        match mutation {
            Mutation::Start(element) => self.start_element(element.clone()),
            Mutation::Extend { id, point } => self.extend_element(id, *point),
            Mutation::EditText { id, text } => self.edit_text(id, text),
            Mutation::Move { id, point } => self.move_element(id, *point),
            Mutation::ApplyMask { id, strokes, widths } => self.apply_mask(id, strokes, widths),
            Mutation::Remove { id } => self.remove_element(id),
            Mutation::Undo => self.undo(),
            Mutation::Redo => self.redo(),
            Mutation::Checkpoint => self.checkpoint(),
            Mutation::Reset => self.reset(),
        }
    }
}
