use canvas::doc::{Point, StyleOptions, Tool, ToolSettings};
use canvas::store::CanvasStore;

use super::*;

fn line(id: &str, from: Point, to: Point) -> Element {
    let mut el = Element::create(id, Tool::Pencil, from, &StyleOptions::default(), &ToolSettings::default());
    if let canvas::doc::Shape::Line { points } = &mut el.shape {
        points.push(to);
    }
    el
}

fn store_with_masked_line() -> CanvasStore {
    let mut store = CanvasStore::new();
    store.start_element(line("plain", Point::new(0.0, 200.0), Point::new(50.0, 200.0)));
    store.start_element(line("erased", Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
    store.apply_mask("erased", &[vec![Point::new(50.0, -10.0), Point::new(50.0, 10.0)]], &[6.0]);
    store
}

#[test]
fn only_masked_elements_are_rasterized() {
    let store = store_with_masked_line();
    let mut cache = RenderCache::new();

    assert_eq!(cache.sync(store.elements()), 1);
    assert!(cache.bitmap("erased").is_some());
    assert!(cache.bitmap("plain").is_none());

    let kinds: Vec<bool> = cache
        .drawables(store.elements())
        .iter()
        .map(|d| matches!(d, Drawable::Bitmap(_)))
        .collect();
    assert_eq!(kinds, vec![false, true]);
}

#[test]
fn unchanged_elements_are_not_rerasterized() {
    let store = store_with_masked_line();
    let mut cache = RenderCache::new();
    cache.sync(store.elements());
    assert_eq!(cache.sync(store.elements()), 0);
}

#[test]
fn changed_mask_rerasterizes() {
    let mut store = store_with_masked_line();
    let mut cache = RenderCache::new();
    cache.sync(store.elements());

    store.apply_mask("erased", &[vec![Point::new(80.0, -10.0), Point::new(80.0, 10.0)]], &[6.0]);
    assert_eq!(cache.sync(store.elements()), 1);
}

#[test]
fn moved_element_is_drawn_from_fresh_bitmap() {
    let mut store = store_with_masked_line();
    let mut cache = RenderCache::new();
    cache.sync(store.elements());
    let before = cache.bitmap("erased").expect("bitmap").origin;

    store.move_element("erased", Point::new(100.0, 100.0));
    cache.sync(store.elements());
    let after = cache.bitmap("erased").expect("bitmap").origin;
    assert_eq!((after.x - before.x, after.y - before.y), (100.0, 100.0));
}

#[test]
fn undo_past_mask_evicts_bitmap() {
    let mut store = store_with_masked_line();
    let mut cache = RenderCache::new();
    cache.sync(store.elements());

    store.undo();
    cache.sync(store.elements());
    assert!(cache.is_empty());
}

#[test]
fn stale_entries_fall_back_to_vector_until_synced() {
    let mut store = store_with_masked_line();
    let mut cache = RenderCache::new();
    cache.sync(store.elements());

    store.move_element("erased", Point::new(5.0, 5.0));
    let drawables = cache.drawables(store.elements());
    assert!(matches!(drawables[1], Drawable::Vector(_)));
}
