//! Eraser gesture state machine.
//!
//! An eraser gesture is pointer-down, any number of pointer-moves, then
//! pointer-up. While it runs, a transient scratch line shows the eraser trail
//! to everyone, and every element the accumulated trail touches is recorded.
//! On release each touched element gets the whole trail appended to its mask
//! and the scratch line is removed.
//!
//! The machine does not own the canvas. Each handler returns the mutations
//! the caller must apply locally and forward to the room, in order.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::ERASE_THRESHOLD;
use crate::doc::{Element, ElementId, Point, StyleOptions, Tool, ToolSettings};
use crate::geometry::hit_test;
use crate::store::Mutation;

/// Scratch-line color while erasing.
const TRAIL_COLOR: &str = "#ffffff";

/// Internal state of the eraser gesture.
#[derive(Debug, Clone, Default)]
pub enum EraserState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Pointer is down and the trail is being drawn.
    Erasing {
        /// Id of the transient scratch line.
        scratch_id: ElementId,
        /// Trail so far, starting at the pointer-down position.
        trail: Vec<Point>,
        /// Eraser stroke width; becomes the mask line width.
        width: f64,
        /// Elements touched so far, in first-touch order.
        touched: Vec<ElementId>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct EraserGesture {
    state: EraserState,
}

impl EraserGesture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, EraserState::Erasing { .. })
    }

    #[must_use]
    pub fn state(&self) -> &EraserState {
        &self.state
    }

    /// Elements touched by the gesture in progress.
    #[must_use]
    pub fn touched(&self) -> &[ElementId] {
        match &self.state {
            EraserState::Idle => &[],
            EraserState::Erasing { touched, .. } => touched,
        }
    }

    /// Begin a gesture at `point`. Returns the scratch-line start.
    ///
    /// A pointer-down during an active gesture restarts it; the old scratch
    /// line is removed first.
    pub fn pointer_down(&mut self, scratch_id: impl Into<ElementId>, point: Point, settings: &ToolSettings) -> Vec<Mutation> {
        let mut out = Vec::new();
        if let EraserState::Erasing { scratch_id: old, .. } = std::mem::take(&mut self.state) {
            out.push(Mutation::Remove { id: old });
        }

        let style = StyleOptions { color: Some(TRAIL_COLOR.into()), opacity: Some(1.0), transient: true, ..StyleOptions::default() };
        let scratch = Element::create(scratch_id, Tool::Eraser, point, &style, settings);
        self.state = EraserState::Erasing {
            scratch_id: scratch.id.clone(),
            trail: vec![point],
            width: scratch.stroke_width,
            touched: Vec::new(),
        };
        out.push(Mutation::Start(scratch));
        out
    }

    /// Extend the trail to `point` and hit-test it against `elements`.
    /// Returns the scratch-line extension; nothing when idle.
    pub fn pointer_move(&mut self, point: Point, elements: &[Element]) -> Vec<Mutation> {
        let EraserState::Erasing { scratch_id, trail, touched, .. } = &mut self.state else {
            return Vec::new();
        };
        trail.push(point);
        for el in elements {
            if el.transient || touched.contains(&el.id) {
                continue;
            }
            if hit_test(trail, el, ERASE_THRESHOLD) {
                touched.push(el.id.clone());
            }
        }
        vec![Mutation::Extend { id: scratch_id.clone(), point }]
    }

    /// Finish the gesture: mask every touched element with the trail, then
    /// drop the scratch line. Nothing when idle.
    pub fn pointer_up(&mut self) -> Vec<Mutation> {
        let EraserState::Erasing { scratch_id, trail, width, touched } = std::mem::take(&mut self.state) else {
            return Vec::new();
        };
        let mut out: Vec<Mutation> = touched
            .into_iter()
            .map(|id| Mutation::ApplyMask { id, strokes: vec![trail.clone()], widths: vec![width] })
            .collect();
        out.push(Mutation::Remove { id: scratch_id });
        out
    }
}
