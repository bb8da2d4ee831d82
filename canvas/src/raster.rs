//! Mask compositing into offscreen bitmaps.
//!
//! DESIGN
//! ======
//! Erasing is simulated, not computed. An element with a non-empty mask is
//! painted into a transparent pixmap sized to its geometry plus every mask
//! point (padded so round caps are not clipped), and each mask line is then
//! stroked over it with destination-out blending, punching transparent holes.
//! The caller draws the bitmap at `Bitmap::origin` instead of the vector path.
//!
//! Unmasked elements return `None` and keep rendering as vectors.
//!
//! Output depends only on the element, so two participants rasterizing the
//! same element get byte-identical pixels.

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

use tiny_skia::{BlendMode, Color, FillRule, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::consts::{BRUSH_SPLINE_SEGMENTS, MARKER_OPACITY, MAX_BITMAP_EDGE, RASTER_PADDING};
use crate::doc::{Element, MaskLine, Point, Shape, Tool};
use crate::geometry::bounds_with_mask;
use crate::text::{TextLayout, char_width};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("bitmap {width}x{height} exceeds the {MAX_BITMAP_EDGE}px edge limit")]
    TooLarge { width: u32, height: u32 },
    #[error("could not allocate a {width}x{height} pixmap")]
    Allocation { width: u32, height: u32 },
    #[error("png encoding failed: {0}")]
    Png(String),
}

/// A rasterized element, positioned at `origin` in canvas coordinates.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub origin: Point,
    pub pixmap: Pixmap,
}

impl Bitmap {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA bytes, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Alpha of the pixel covering canvas point `p`, 0 outside the bitmap.
    #[must_use]
    pub fn alpha_at(&self, p: Point) -> u8 {
        let (x, y) = (p.x - self.origin.x, p.y - self.origin.y);
        if x < 0.0 || y < 0.0 {
            return 0;
        }
        self.pixmap.pixel(x as u32, y as u32).map_or(0, |px| px.alpha())
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::Png`] if the encoder fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        self.pixmap.encode_png().map_err(|e| RasterError::Png(e.to_string()))
    }
}

/// Rasterize `element` with its mask applied.
///
/// Returns `Ok(None)` when the element has no mask lines or its padded box
/// has no area.
///
/// # Errors
///
/// Returns [`RasterError`] if the box is larger than the bitmap edge limit or
/// the pixmap cannot be allocated.
pub fn rasterize(element: &Element) -> Result<Option<Bitmap>, RasterError> {
    if !element.has_mask() {
        return Ok(None);
    }
    let Some(bounds) = bounds_with_mask(element) else {
        return Ok(None);
    };
    let pad = RASTER_PADDING / 2.0;
    let origin = Point::new((bounds.min_x - pad).floor(), (bounds.min_y - pad).floor());
    let w = (bounds.max_x + pad - origin.x).ceil();
    let h = (bounds.max_y + pad - origin.y).ceil();
    if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
        return Ok(None);
    }
    let (width, height) = (w as u32, h as u32);
    if width > MAX_BITMAP_EDGE || height > MAX_BITMAP_EDGE {
        return Err(RasterError::TooLarge { width, height });
    }
    let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;

    let transform = Transform::from_translate(-origin.x as f32, -origin.y as f32);
    paint_element(&mut pixmap, element, transform);
    for line in element.mask_lines() {
        punch(&mut pixmap, line, transform);
    }

    Ok(Some(Bitmap { origin, pixmap }))
}

// =============================================================================
// PAINTING
// =============================================================================

fn paint_for(color: &str, opacity: f64) -> Paint<'static> {
    let mut color = parse_color(color).unwrap_or(Color::BLACK);
    color.set_alpha(color.alpha() * opacity.clamp(0.0, 1.0) as f32);
    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

fn round_stroke(width: f64) -> Stroke {
    Stroke { width: width.max(0.0) as f32, line_cap: LineCap::Round, line_join: LineJoin::Round, ..Stroke::default() }
}

fn polyline_path(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.finish()
}

/// Stroke `points` with round caps, or fill a round dot when the polyline
/// has a single distinct point.
fn stroke_polyline(pixmap: &mut Pixmap, points: &[Point], width: f64, paint: &Paint, transform: Transform) {
    let Some(first) = points.first() else {
        return;
    };
    if points.iter().all(|p| p == first) {
        if let Some(dot) = PathBuilder::from_circle(first.x as f32, first.y as f32, (width / 2.0).max(0.5) as f32) {
            pixmap.fill_path(&dot, paint, FillRule::Winding, transform, None);
        }
        return;
    }
    if let Some(path) = polyline_path(points) {
        pixmap.stroke_path(&path, paint, &round_stroke(width), transform, None);
    }
}

fn paint_element(pixmap: &mut Pixmap, element: &Element, transform: Transform) {
    let outline = element.stroke_color.as_deref().unwrap_or(&element.color);
    match &element.shape {
        Shape::Line { points } => {
            let mut paint = match element.tool {
                Tool::Eraser => paint_for("#ffffff", element.opacity),
                Tool::Marker => paint_for(&element.color, element.opacity * MARKER_OPACITY),
                _ => paint_for(&element.color, element.opacity),
            };
            if element.tool == Tool::Marker {
                paint.blend_mode = BlendMode::Multiply;
            }
            let smoothed;
            let points = if element.tool == Tool::Brush {
                smoothed = catmull_rom(points, BRUSH_SPLINE_SEGMENTS);
                &smoothed
            } else {
                points
            };
            stroke_polyline(pixmap, points, element.stroke_width, &paint, transform);
        }
        Shape::Rect { start, end } => {
            let rect = Rect::from_ltrb(
                start.x.min(end.x) as f32,
                start.y.min(end.y) as f32,
                start.x.max(end.x) as f32,
                start.y.max(end.y) as f32,
            );
            if let Some(rect) = rect {
                let path = PathBuilder::from_rect(rect);
                fill_and_outline(pixmap, &path, element, outline, transform);
            }
        }
        Shape::Circle { center, radius } => {
            if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, *radius as f32) {
                fill_and_outline(pixmap, &path, element, outline, transform);
            }
        }
        Shape::Text { point, text } => paint_text(pixmap, *point, text, element, outline, transform),
    }
}

fn fill_and_outline(pixmap: &mut Pixmap, path: &Path, element: &Element, outline: &str, transform: Transform) {
    pixmap.fill_path(path, &paint_for(&element.color, element.opacity), FillRule::Winding, transform, None);
    if element.stroke_width > 0.0 {
        let stroke = Stroke { width: element.stroke_width as f32, ..Stroke::default() };
        pixmap.stroke_path(path, &paint_for(outline, element.opacity), &stroke, transform, None);
    }
}

/// Text renders as one block per visible glyph, laid out exactly as the
/// wrap and hit-test code sees it.
fn paint_text(pixmap: &mut Pixmap, origin: Point, text: &str, element: &Element, outline: &str, transform: Transform) {
    let layout = TextLayout::new(origin, text, element.stroke_width);
    let fill = paint_for(&element.color, element.opacity);
    let edge = (outline != element.color).then(|| paint_for(outline, element.opacity));
    let glyph_top = layout.line_height * 0.15;
    let glyph_height = layout.line_height * 0.7;

    for ((top_left, _, _), line) in layout.line_boxes().into_iter().zip(&layout.lines) {
        let mut x = top_left.x;
        for ch in line.chars() {
            let advance = char_width(ch, layout.font_size);
            if !ch.is_whitespace() {
                let glyph = Rect::from_xywh(
                    x as f32,
                    (top_left.y + glyph_top) as f32,
                    (advance * 0.8) as f32,
                    glyph_height as f32,
                );
                if let Some(glyph) = glyph {
                    pixmap.fill_rect(glyph, &fill, transform, None);
                    if let Some(edge) = &edge {
                        let path = PathBuilder::from_rect(glyph);
                        pixmap.stroke_path(&path, edge, &Stroke::default(), transform, None);
                    }
                }
            }
            x += advance;
        }
    }
}

/// Clear every pixel under a mask line.
fn punch(pixmap: &mut Pixmap, line: &MaskLine, transform: Transform) {
    let mut paint = Paint::default();
    paint.set_color(Color::BLACK);
    paint.anti_alias = true;
    paint.blend_mode = BlendMode::DestinationOut;
    stroke_polyline(pixmap, &line.points, line.stroke_width, &paint, transform);
}

// =============================================================================
// HELPERS
// =============================================================================

/// Interpolate a Catmull-Rom spline through `points` with `segments` samples
/// per span. Fewer than three points are returned unchanged.
#[must_use]
pub fn catmull_rom(points: &[Point], segments: usize) -> Vec<Point> {
    let n = points.len();
    if n < 3 || segments == 0 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity((n - 1) * segments + 1);
    for i in 0..n - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(n - 1)];
        for s in 0..segments {
            let t = s as f64 / segments as f64;
            let (t2, t3) = (t * t, t * t * t);
            let blend = |a: f64, b: f64, c: f64, d: f64| {
                0.5 * ((2.0 * b) + (-a + c) * t + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2 + (-a + 3.0 * b - 3.0 * c + d) * t3)
            };
            out.push(Point::new(blend(p0.x, p1.x, p2.x, p3.x), blend(p0.y, p1.y, p2.y, p3.y)));
        }
    }
    out.push(points[n - 1]);
    out
}

/// Parse a CSS-style color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()`
/// or a handful of common names.
#[must_use]
pub fn parse_color(raw: &str) -> Option<Color> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(body) = raw.strip_prefix("rgba(").or_else(|| raw.strip_prefix("rgb(")) {
        return parse_rgb_fn(body.strip_suffix(')')?);
    }
    let rgb = match raw.to_ascii_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "gray" | "grey" => (128, 128, 128),
        "transparent" => return Some(Color::TRANSPARENT),
        _ => return None,
    };
    Some(Color::from_rgba8(rgb.0, rgb.1, rgb.2, 255))
}

fn hex_byte(digits: &str) -> Option<u8> {
    match u8::from_str_radix(digits, 16) {
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut c = hex.chars().map(|d| hex_byte(&d.to_string()).map(|v| v * 17));
            Some(Color::from_rgba8(c.next()??, c.next()??, c.next()??, 255))
        }
        6 | 8 => {
            let r = hex_byte(&hex[0..2])?;
            let g = hex_byte(&hex[2..4])?;
            let b = hex_byte(&hex[4..6])?;
            let a = if hex.len() == 8 { hex_byte(&hex[6..8])? } else { 255 };
            Some(Color::from_rgba8(r, g, b, a))
        }
        _ => None,
    }
}

fn parse_rgb_fn(body: &str) -> Option<Color> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    let channel = |s: &str| match s.parse::<f64>() {
        Ok(v) => Some(v.clamp(0.0, 255.0) as u8),
        Err(_) => None,
    };
    let (r, g, b) = match parts.as_slice() {
        [r, g, b] | [r, g, b, _] => (channel(*r)?, channel(*g)?, channel(*b)?),
        _ => return None,
    };
    let a = match parts.get(3) {
        Some(a) => match a.parse::<f64>() {
            Ok(v) => (v.clamp(0.0, 1.0) * 255.0).round() as u8,
            Err(_) => return None,
        },
        None => 255,
    };
    Some(Color::from_rgba8(r, g, b, a))
}
