//! Document model: canvas elements, their masks, and the style settings used
//! to create them.
//!
//! An [`Element`] is one drawable object in a room. The common style fields
//! live on the struct; the per-variant geometry lives in [`Shape`], a sum type
//! flattened into the same JSON object under a `type` tag so the wire shape is
//! `{"id": .., "type": "rect", "start": [x, y], "end": [x, y], ..}`.
//!
//! Erasing never edits geometry. It appends [`MaskLine`]s to the element's
//! [`Mask`], and the rasterizer composites them at render time.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};

/// Opaque element identifier chosen by the participant that created it.
pub type ElementId = String;

/// A point in absolute canvas coordinates. Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// This point shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// The drawing instrument that produced an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    /// Plain free-hand stroke (default).
    #[default]
    Pencil,
    /// Smoothed free-hand stroke.
    Brush,
    /// Translucent free-hand stroke.
    Marker,
    /// Eraser trail; its strokes become masks on the elements it touches.
    Eraser,
    /// Axis-aligned rectangle.
    Rect,
    /// Circle sized by dragging away from the center.
    Circle,
    /// Text block anchored at its top-left corner.
    Text,
    /// Selection / drag meta-tool. Never draws.
    Select,
}

/// One erase stroke recorded against an element, in the element's own
/// (absolute canvas) coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskLine {
    pub points: Vec<Point>,
    pub stroke_width: f64,
}

/// Accumulated erase strokes. Lines are only ever appended.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mask {
    pub lines: Vec<MaskLine>,
}

/// Per-variant geometry of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Free-hand polyline; grows by append while being drawn.
    Line { points: Vec<Point> },
    /// Box spanning the min/max of `start` and `end`.
    Rect { start: Point, end: Point },
    /// Circle whose radius is the drag distance from `center`.
    Circle { center: Point, radius: f64 },
    /// Text block with its top-left corner at `point`.
    Text { point: Point, text: String },
}

/// One persisted drawable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub tool: Tool,
    pub color: String,
    pub stroke_width: f64,
    pub opacity: f64,
    /// Outline color for rect/circle/text. Lines carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Mask>,
    /// Eraser trail shown while a gesture is in progress. Never hit-tested,
    /// never part of an undo snapshot, removed when the gesture ends.
    #[serde(rename = "isTemp", default, skip_serializing_if = "is_false")]
    pub transient: bool,
    #[serde(flatten)]
    pub shape: Shape,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// The participant's current tool settings. Every style field a caller leaves
/// unset when creating an element is taken from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    pub tool: Tool,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self { tool: Tool::Pencil, color: "#000000".into(), stroke_color: None, stroke_width: 2.0, opacity: 1.0 }
    }
}

/// Explicit style overrides for a new element. `None` means "use the current
/// tool settings".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleOptions {
    pub color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    /// Initial content for text elements.
    pub text: Option<String>,
    pub transient: bool,
}

impl Element {
    /// Build a new element for `tool` anchored at `point`.
    ///
    /// The variant follows the tool (`Rect`, `Circle`, `Text`, anything else
    /// draws a line). Geometry starts degenerate: a one-point line, a
    /// zero-size rect, a zero-radius circle.
    #[must_use]
    pub fn create(
        id: impl Into<ElementId>,
        tool: Tool,
        point: Point,
        style: &StyleOptions,
        settings: &ToolSettings,
    ) -> Self {
        let color = style.color.clone().unwrap_or_else(|| settings.color.clone());
        let shape = match tool {
            Tool::Rect => Shape::Rect { start: point, end: point },
            Tool::Circle => Shape::Circle { center: point, radius: 0.0 },
            Tool::Text => Shape::Text { point, text: style.text.clone().unwrap_or_default() },
            Tool::Pencil | Tool::Brush | Tool::Marker | Tool::Eraser | Tool::Select => {
                Shape::Line { points: vec![point] }
            }
        };
        let stroke_color = match shape {
            Shape::Line { .. } => None,
            Shape::Rect { .. } | Shape::Circle { .. } | Shape::Text { .. } => Some(
                style
                    .stroke_color
                    .clone()
                    .or_else(|| settings.stroke_color.clone())
                    .unwrap_or_else(|| color.clone()),
            ),
        };

        Self {
            id: id.into(),
            tool,
            color,
            stroke_width: style.stroke_width.unwrap_or(settings.stroke_width),
            opacity: style.opacity.unwrap_or(settings.opacity),
            stroke_color,
            mask: None,
            transient: style.transient,
            shape,
        }
    }

    /// The point a move is measured from: first line point, rect start,
    /// circle center, or text corner.
    #[must_use]
    pub fn anchor(&self) -> Point {
        match &self.shape {
            Shape::Line { points } => points.first().copied().unwrap_or_default(),
            Shape::Rect { start, .. } => *start,
            Shape::Circle { center, .. } => *center,
            Shape::Text { point, .. } => *point,
        }
    }

    /// Wire name of the variant (`"line"`, `"rect"`, `"circle"`, `"text"`).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.shape {
            Shape::Line { .. } => "line",
            Shape::Rect { .. } => "rect",
            Shape::Circle { .. } => "circle",
            Shape::Text { .. } => "text",
        }
    }

    /// Mask lines attached to this element, empty when unmasked.
    #[must_use]
    pub fn mask_lines(&self) -> &[MaskLine] {
        self.mask.as_ref().map_or(&[], |m| m.lines.as_slice())
    }

    /// Whether any erase stroke has been recorded against this element.
    #[must_use]
    pub fn has_mask(&self) -> bool {
        !self.mask_lines().is_empty()
    }
}
