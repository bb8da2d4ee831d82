//! Eraser hit-testing, translation and bounding boxes.
//!
//! All coordinates are absolute canvas units. Masks live in the same space as
//! the geometry they cut, so every translation moves mask points too.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use crate::doc::{Element, Point, Shape};
use crate::text::TextLayout;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Box spanning two corners in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self { min_x: a.x.min(b.x), min_y: a.y.min(b.y), max_x: a.x.max(b.x), max_y: a.y.max(b.y) }
    }

    /// Smallest box containing every point, `None` for an empty slice.
    #[must_use]
    pub fn of_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = Self::from_corners(*first, *first);
        for p in rest {
            b.include(*p);
        }
        Some(b)
    }

    pub fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow every side by `by`.
    #[must_use]
    pub fn expand(self, by: f64) -> Self {
        Self { min_x: self.min_x - by, min_y: self.min_y - by, max_x: self.max_x + by, max_y: self.max_y + by }
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

// =============================================================================
// HIT TESTING
// =============================================================================

/// Whether the eraser polyline touches `element`.
///
/// Lines test each eraser sample point against the nearest line segment,
/// within `max(threshold, strokeWidth)`. Only sample points count, so a
/// sparse sweep can pass over a line without touching it. Rects, circles
/// and text blocks are grown by `threshold` and tested against each eraser
/// point. An empty eraser stroke and transient elements never hit.
#[must_use]
pub fn hit_test(eraser: &[Point], element: &Element, threshold: f64) -> bool {
    if eraser.is_empty() || element.transient {
        return false;
    }
    match &element.shape {
        Shape::Line { points } => {
            let reach = threshold.max(element.stroke_width);
            eraser.iter().any(|p| point_polyline_distance(*p, points) <= reach)
        }
        Shape::Rect { start, end } => {
            let grown = Bounds::from_corners(*start, *end).expand(threshold);
            eraser.iter().any(|p| grown.contains(*p))
        }
        Shape::Circle { center, radius } => eraser.iter().any(|p| p.distance(*center) <= radius + threshold),
        Shape::Text { point, text } => {
            let layout = TextLayout::new(*point, text, element.stroke_width);
            layout.line_boxes().iter().any(|(top_left, w, h)| {
                let grown = Bounds::from_corners(*top_left, top_left.offset(*w, *h)).expand(threshold);
                eraser.iter().any(|p| grown.contains(*p))
            })
        }
    }
}

/// Distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Segments of a polyline; a single point becomes one zero-length segment.
fn segments(points: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let single = (points.len() == 1).then(|| (points[0], points[0]));
    points.windows(2).map(|w| (w[0], w[1])).chain(single)
}

/// Distance from `p` to the nearest segment of `points`, `f64::INFINITY` if
/// the polyline is empty.
#[must_use]
pub fn point_polyline_distance(p: Point, points: &[Point]) -> f64 {
    segments(points).map(|(a, b)| point_segment_distance(p, a, b)).fold(f64::INFINITY, f64::min)
}

// =============================================================================
// TRANSLATION
// =============================================================================

/// Shift every geometry point and every mask point by `(dx, dy)`.
pub fn translate_by(element: &mut Element, dx: f64, dy: f64) {
    match &mut element.shape {
        Shape::Line { points } => {
            for p in points.iter_mut() {
                *p = p.offset(dx, dy);
            }
        }
        Shape::Rect { start, end } => {
            *start = start.offset(dx, dy);
            *end = end.offset(dx, dy);
        }
        Shape::Circle { center, .. } => *center = center.offset(dx, dy),
        Shape::Text { point, .. } => *point = point.offset(dx, dy),
    }
    if let Some(mask) = element.mask.as_mut() {
        for p in mask.lines.iter_mut().flat_map(|l| l.points.iter_mut()) {
            *p = p.offset(dx, dy);
        }
    }
}

/// Move `element` so its anchor lands on `anchor`, carrying its mask along.
pub fn translate_to(element: &mut Element, anchor: Point) {
    let old = element.anchor();
    translate_by(element, anchor.x - old.x, anchor.y - old.y);
}

// =============================================================================
// BOUNDS
// =============================================================================

/// Bounding box of the element geometry alone (no stroke width, no mask).
/// `None` for a line with no points.
#[must_use]
pub fn bounds(element: &Element) -> Option<Bounds> {
    match &element.shape {
        Shape::Line { points } => Bounds::of_points(points),
        Shape::Rect { start, end } => Some(Bounds::from_corners(*start, *end)),
        Shape::Circle { center, radius } => {
            let r = radius.abs();
            Some(Bounds::from_corners(center.offset(-r, -r), center.offset(r, r)))
        }
        Shape::Text { point, text } => {
            let layout = TextLayout::new(*point, text, element.stroke_width);
            Some(Bounds::from_corners(*point, point.offset(layout.width(), layout.height())))
        }
    }
}

/// Geometry bounds grown to cover every mask point.
#[must_use]
pub fn bounds_with_mask(element: &Element) -> Option<Bounds> {
    let mask_points: Vec<Point> = element.mask_lines().iter().flat_map(|l| l.points.iter().copied()).collect();
    match (bounds(element), Bounds::of_points(&mask_points)) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
    }
}
