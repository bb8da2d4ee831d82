use super::*;
use crate::doc::{Mask, StyleOptions, ToolSettings};

fn pts(raw: &[[f64; 2]]) -> Vec<Point> {
    raw.iter().map(|p| Point::from(*p)).collect()
}

fn masked_line() -> Element {
    let style = StyleOptions { stroke_width: Some(10.0), color: Some("#000000".into()), ..StyleOptions::default() };
    let mut el = Element::create("l", Tool::Pencil, Point::new(0.0, 0.0), &style, &ToolSettings::default());
    el.shape = Shape::Line { points: pts(&[[0.0, 0.0], [100.0, 0.0]]) };
    el.mask = Some(Mask { lines: vec![MaskLine { points: pts(&[[50.0, -20.0], [50.0, 20.0]]), stroke_width: 10.0 }] });
    el
}

// =============================================================
// rasterize
// =============================================================

#[test]
fn unmasked_element_is_not_rasterized() {
    let el = Element::create("l", Tool::Pencil, Point::new(0.0, 0.0), &StyleOptions::default(), &ToolSettings::default());
    assert!(rasterize(&el).unwrap().is_none());
}

#[test]
fn empty_mask_is_not_rasterized() {
    let mut el = masked_line();
    el.mask = Some(Mask::default());
    assert!(rasterize(&el).unwrap().is_none());
}

#[test]
fn bitmap_is_padded_around_geometry_and_mask() {
    let bitmap = rasterize(&masked_line()).unwrap().unwrap();
    assert_eq!(bitmap.origin, Point::new(-30.0, -50.0));
    assert_eq!(bitmap.width(), 160);
    assert_eq!(bitmap.height(), 100);
}

#[test]
fn mask_punches_transparent_hole() {
    let bitmap = rasterize(&masked_line()).unwrap().unwrap();
    assert_eq!(bitmap.alpha_at(Point::new(50.0, 0.0)), 0);
    assert_eq!(bitmap.alpha_at(Point::new(20.0, 0.0)), 255);
    assert_eq!(bitmap.alpha_at(Point::new(20.0, 30.0)), 0);
}

#[test]
fn rasterization_is_deterministic() {
    let el = masked_line();
    let a = rasterize(&el).unwrap().unwrap();
    let b = rasterize(&el).unwrap().unwrap();
    assert_eq!(a.pixels(), b.pixels());
    assert_eq!(a.origin, b.origin);
}

#[test]
fn single_point_mask_punches_dot() {
    let style = StyleOptions { color: Some("#ff0000".into()), ..StyleOptions::default() };
    let mut el = Element::create("r", Tool::Rect, Point::new(0.0, 0.0), &style, &ToolSettings::default());
    el.shape = Shape::Rect { start: Point::new(0.0, 0.0), end: Point::new(40.0, 40.0) };
    el.mask = Some(Mask { lines: vec![MaskLine { points: pts(&[[20.0, 20.0]]), stroke_width: 10.0 }] });
    let bitmap = rasterize(&el).unwrap().unwrap();
    assert_eq!(bitmap.alpha_at(Point::new(20.0, 20.0)), 0);
    assert_eq!(bitmap.alpha_at(Point::new(10.0, 10.0)), 255);
}

#[test]
fn erasing_circle_keeps_geometry() {
    let mut el = Element::create("c", Tool::Circle, Point::new(50.0, 50.0), &StyleOptions::default(), &ToolSettings::default());
    el.shape = Shape::Circle { center: Point::new(50.0, 50.0), radius: 20.0 };
    el.mask = Some(Mask { lines: vec![MaskLine { points: pts(&[[20.0, 50.0], [80.0, 50.0]]), stroke_width: 6.0 }] });
    let before = el.shape.clone();
    let bitmap = rasterize(&el).unwrap().unwrap();
    assert_eq!(el.shape, before);
    assert_eq!(bitmap.alpha_at(Point::new(50.0, 50.0)), 0);
    assert_eq!(bitmap.alpha_at(Point::new(50.0, 40.0)), 255);
}

#[test]
fn text_element_rasterizes() {
    let style = StyleOptions { text: Some("hi".into()), ..StyleOptions::default() };
    let mut el = Element::create("t", Tool::Text, Point::new(0.0, 0.0), &style, &ToolSettings::default());
    el.mask = Some(Mask { lines: vec![MaskLine { points: pts(&[[2.0, 2.0]]), stroke_width: 2.0 }] });
    let bitmap = rasterize(&el).unwrap().unwrap();
    assert!(bitmap.pixels().iter().any(|b| *b != 0));
}

#[test]
fn oversized_element_is_rejected() {
    let mut el = masked_line();
    el.shape = Shape::Line { points: pts(&[[0.0, 0.0], [20_000.0, 0.0]]) };
    assert!(matches!(rasterize(&el), Err(RasterError::TooLarge { .. })));
}

#[test]
fn bitmap_encodes_to_png() {
    let png = rasterize(&masked_line()).unwrap().unwrap().encode_png().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

// =============================================================
// Helpers
// =============================================================

#[test]
fn parse_color_forms() {
    assert_eq!(parse_color("#fff"), Some(Color::from_rgba8(255, 255, 255, 255)));
    assert_eq!(parse_color("#102030"), Some(Color::from_rgba8(16, 32, 48, 255)));
    assert_eq!(parse_color("#10203080"), Some(Color::from_rgba8(16, 32, 48, 128)));
    assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Color::from_rgba8(1, 2, 3, 255)));
    assert_eq!(parse_color("rgba(1,2,3,0)"), Some(Color::from_rgba8(1, 2, 3, 0)));
    assert_eq!(parse_color("White"), Some(Color::from_rgba8(255, 255, 255, 255)));
    assert_eq!(parse_color("#zzzzzz"), None);
    assert_eq!(parse_color("not-a-color"), None);
}

#[test]
fn catmull_rom_passes_through_endpoints() {
    let input = pts(&[[0.0, 0.0], [10.0, 10.0], [20.0, 0.0]]);
    let out = catmull_rom(&input, 4);
    assert_eq!(out.len(), 9);
    assert_eq!(out[0], input[0]);
    assert_eq!(out[4], input[1]);
    assert_eq!(out[8], input[2]);
}

#[test]
fn catmull_rom_short_input_unchanged() {
    let input = pts(&[[0.0, 0.0], [5.0, 5.0]]);
    assert_eq!(catmull_rom(&input, 8), input);
}
