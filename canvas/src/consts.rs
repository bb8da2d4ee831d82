//! Shared numeric constants for the canvas crate.

// ── Hit-testing ─────────────────────────────────────────────────

/// Default distance, in canvas units, within which an eraser stroke counts as touching.
pub const ERASE_THRESHOLD: f64 = 10.0;

// ── Masks ───────────────────────────────────────────────────────

/// Width used for a mask line when the sender supplied fewer widths than strokes.
pub const DEFAULT_MASK_WIDTH: f64 = 2.0;

// ── Text layout ─────────────────────────────────────────────────

/// Logical canvas width; text wraps against its right edge.
pub const BASE_WIDTH: f64 = 750.0;

/// Gap kept between wrapped text and the right edge of the canvas.
pub const TEXT_PADDING: f64 = 10.0;

/// Text font size is the element stroke width times this factor.
pub const FONT_SCALE: f64 = 4.0;

/// Line height as a multiple of font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

// ── Rasterization ───────────────────────────────────────────────

/// Total padding added around a masked element's bounding box (half per side).
pub const RASTER_PADDING: f64 = 60.0;

/// Largest bitmap edge the rasterizer will allocate.
pub const MAX_BITMAP_EDGE: u32 = 8192;

/// Opacity multiplier applied to marker strokes.
pub const MARKER_OPACITY: f64 = 0.8;

/// Interpolated samples per segment when smoothing brush strokes.
pub const BRUSH_SPLINE_SEGMENTS: usize = 8;
