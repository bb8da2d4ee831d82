#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{StyleOptions, Tool, ToolSettings};

fn el(id: &str, tool: Tool, x: f64, y: f64) -> Element {
    Element::create(id, tool, Point::new(x, y), &StyleOptions::default(), &ToolSettings::default())
}

fn transient(id: &str) -> Element {
    let style = StyleOptions { transient: true, ..StyleOptions::default() };
    Element::create(id, Tool::Eraser, Point::default(), &style, &ToolSettings::default())
}

fn line_points(store: &CanvasStore, id: &str) -> Vec<Point> {
    match &store.get(id).unwrap().shape {
        Shape::Line { points } => points.clone(),
        other => panic!("expected line, got {other:?}"),
    }
}

// =============================================================
// Drawing
// =============================================================

#[test]
fn pencil_line_grows_by_append() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 10.0, 10.0));
    store.extend_element("a", Point::new(20.0, 10.0));
    store.extend_element("a", Point::new(20.0, 20.0));
    assert_eq!(
        line_points(&store, "a"),
        vec![Point::new(10.0, 10.0), Point::new(20.0, 10.0), Point::new(20.0, 20.0)]
    );
    assert_eq!(store.undo_depth(), 1);
    assert_eq!(store.undo.last(), Some(&Vec::new()));
}

#[test]
fn extend_rect_sets_end_and_circle_sets_radius() {
    let mut store = CanvasStore::new();
    store.start_element(el("r", Tool::Rect, 0.0, 0.0));
    store.start_element(el("c", Tool::Circle, 0.0, 0.0));
    assert!(store.extend_element("r", Point::new(5.0, 6.0)));
    assert!(store.extend_element("c", Point::new(3.0, 4.0)));
    assert_eq!(store.get("r").unwrap().shape, Shape::Rect { start: Point::new(0.0, 0.0), end: Point::new(5.0, 6.0) });
    assert_eq!(store.get("c").unwrap().shape, Shape::Circle { center: Point::new(0.0, 0.0), radius: 5.0 });
}

#[test]
fn extend_does_not_snapshot() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.extend_element("a", Point::new(1.0, 1.0));
    assert_eq!(store.undo_depth(), 1);
}

#[test]
fn extend_text_is_noop() {
    let mut store = CanvasStore::new();
    store.start_element(el("t", Tool::Text, 0.0, 0.0));
    assert!(!store.extend_element("t", Point::new(1.0, 1.0)));
}

#[test]
fn edit_text_only_touches_text() {
    let mut store = CanvasStore::new();
    store.start_element(el("t", Tool::Text, 0.0, 0.0));
    store.start_element(el("l", Tool::Pencil, 0.0, 0.0));
    assert!(store.edit_text("t", "hello"));
    assert!(!store.edit_text("l", "hello"));
    assert_eq!(store.get("t").unwrap().shape, Shape::Text { point: Point::new(0.0, 0.0), text: "hello".into() });
    assert_eq!(store.undo_depth(), 2);
}

#[test]
fn unknown_ids_are_silent_noops() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    let before = store.clone();
    assert!(!store.extend_element("zz", Point::new(1.0, 1.0)));
    assert!(!store.edit_text("zz", "x"));
    assert!(!store.move_element("zz", Point::new(1.0, 1.0)));
    assert!(!store.apply_mask("zz", &[vec![Point::default()]], &[2.0]));
    assert!(!store.remove_element("zz"));
    assert_eq!(store, before);
}

// =============================================================
// Undo / redo
// =============================================================

#[test]
fn rect_draw_undo_redo() {
    let mut store = CanvasStore::new();
    store.start_element(el("r", Tool::Rect, 0.0, 0.0));
    store.extend_element("r", Point::new(10.0, 10.0));
    let drawn = store.elements().to_vec();

    assert!(store.undo());
    assert!(store.is_empty());
    assert_eq!(store.redo_depth(), 1);

    assert!(store.redo());
    assert_eq!(store.elements(), drawn.as_slice());
    assert_eq!(store.redo_depth(), 0);
}

#[test]
fn undo_then_redo_restores_deep_equal_state() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.extend_element("a", Point::new(4.0, 4.0));
    store.start_element(el("b", Tool::Circle, 9.0, 9.0));
    store.move_element("a", Point::new(50.0, 50.0));
    let before = store.clone();
    store.undo();
    store.redo();
    assert_eq!(store.elements(), before.elements());
    assert_eq!(store.undo_depth(), before.undo_depth());
}

#[test]
fn empty_stacks_are_noops() {
    let mut store = CanvasStore::new();
    assert!(!store.undo());
    assert!(!store.redo());
    assert_eq!(store, CanvasStore::new());
}

#[test]
fn mutation_after_undo_clears_redo() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.undo();
    assert_eq!(store.redo_depth(), 1);
    store.start_element(el("b", Tool::Pencil, 0.0, 0.0));
    assert_eq!(store.redo_depth(), 0);
}

#[test]
fn undo_keeps_redo_stack() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.start_element(el("b", Tool::Pencil, 0.0, 0.0));
    store.undo();
    store.undo();
    assert_eq!(store.redo_depth(), 2);
    store.redo();
    assert_eq!(store.redo_depth(), 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn checkpoint_makes_drag_one_undo_step() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Rect, 0.0, 0.0));
    store.checkpoint();
    store.move_element("a", Point::new(5.0, 5.0));
    store.move_element("a", Point::new(9.0, 9.0));
    assert_eq!(store.get("a").unwrap().anchor(), Point::new(9.0, 9.0));
    assert_eq!(store.undo_depth(), 4);
}

#[test]
fn reset_is_undoable() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.reset();
    assert!(store.is_empty());
    store.undo();
    assert_eq!(store.len(), 1);
}

#[test]
fn remove_takes_no_snapshot() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    assert!(store.remove_element("a"));
    assert!(store.is_empty());
    assert_eq!(store.undo_depth(), 1);
}

// =============================================================
// Masks and moves
// =============================================================

#[test]
fn apply_mask_accumulates_monotonically() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.apply_mask("a", &[vec![Point::new(1.0, 1.0)]], &[8.0]);
    let first = store.get("a").unwrap().mask_lines().to_vec();
    store.apply_mask("a", &[vec![Point::new(2.0, 2.0)], vec![Point::new(3.0, 3.0)]], &[4.0]);
    let lines = store.get("a").unwrap().mask_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(&lines[..1], first.as_slice());
    assert_eq!(lines[1].stroke_width, 4.0);
    assert_eq!(lines[2].stroke_width, DEFAULT_MASK_WIDTH);
}

#[test]
fn apply_mask_is_undoable() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.apply_mask("a", &[vec![Point::new(1.0, 1.0)]], &[8.0]);
    store.undo();
    assert!(!store.get("a").unwrap().has_mask());
}

#[test]
fn moving_masked_line_carries_mask() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.extend_element("a", Point::new(10.0, 10.0));
    store.apply_mask("a", &[vec![Point::new(5.0, 5.0)]], &[4.0]);
    store.move_element("a", Point::new(100.0, 100.0));
    assert_eq!(line_points(&store, "a")[0], Point::new(100.0, 100.0));
    assert_eq!(store.get("a").unwrap().mask_lines()[0].points, vec![Point::new(105.0, 105.0)]);
}

#[test]
fn concurrent_moves_last_write_wins() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Circle, 0.0, 0.0));
    store.apply(&Mutation::Move { id: "a".into(), point: Point::new(1.0, 1.0) });
    store.apply(&Mutation::Move { id: "a".into(), point: Point::new(2.0, 2.0) });
    assert_eq!(store.get("a").unwrap().anchor(), Point::new(2.0, 2.0));
}

// =============================================================
// Transient elements
// =============================================================

#[test]
fn transient_start_skips_stacks() {
    let mut store = CanvasStore::new();
    store.start_element(transient("tmp"));
    assert_eq!(store.len(), 1);
    assert_eq!(store.undo_depth(), 0);
}

#[test]
fn snapshots_exclude_transient_elements() {
    let mut store = CanvasStore::new();
    store.start_element(transient("tmp"));
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    assert!(store.undo.iter().all(|snap| snap.iter().all(|e| !e.transient)));
    store.undo();
    assert!(store.is_empty());
    assert!(store.redo.iter().flatten().all(|e| !e.transient));
}

#[test]
fn mutation_is_transient() {
    assert!(Mutation::Start(transient("t")).is_transient());
    assert!(!Mutation::Start(el("a", Tool::Pencil, 0.0, 0.0)).is_transient());
    assert!(!Mutation::Undo.is_transient());
}

// =============================================================
// Snapshot export
// =============================================================

#[test]
fn snapshot_hydrate_roundtrip() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    store.start_element(el("b", Tool::Rect, 0.0, 0.0));
    store.undo();
    let mut other = CanvasStore::new();
    other.hydrate(store.snapshot());
    assert_eq!(other, store);
}

#[test]
fn snapshot_wire_names() {
    let mut store = CanvasStore::new();
    store.start_element(el("a", Tool::Pencil, 0.0, 0.0));
    let json = serde_json::to_value(store.snapshot()).unwrap();
    assert!(json.get("undoStack").is_some());
    assert!(json.get("redoStack").is_some());
    assert_eq!(json["elements"][0]["id"], "a");
}

#[test]
fn apply_dispatches_every_variant() {
    let mut store = CanvasStore::new();
    assert!(store.apply(&Mutation::Start(el("t", Tool::Text, 0.0, 0.0))));
    assert!(store.apply(&Mutation::EditText { id: "t".into(), text: "x".into() }));
    assert!(!store.apply(&Mutation::Extend { id: "t".into(), point: Point::default() }));
    assert!(store.apply(&Mutation::Checkpoint));
    assert!(store.apply(&Mutation::ApplyMask { id: "t".into(), strokes: vec![vec![Point::default()]], widths: vec![] }));
    assert!(store.apply(&Mutation::Undo));
    assert!(store.apply(&Mutation::Redo));
    assert!(store.apply(&Mutation::Reset));
    assert!(!store.apply(&Mutation::Remove { id: "t".into() }));
}
