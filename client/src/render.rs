//! Bitmap cache for masked elements.
//!
//! An element with no mask is drawn from its vector geometry. Once erased,
//! it is drawn from a bitmap with the mask composited in. Rasterizing is
//! the expensive step, so bitmaps are kept until the element changes.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::collections::HashMap;

use canvas::doc::{Element, ElementId};
use canvas::raster::{Bitmap, rasterize};
use tracing::warn;

/// How to draw one element.
#[derive(Debug, Clone, Copy)]
pub enum Drawable<'a> {
    Vector(&'a Element),
    Bitmap(&'a Bitmap),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    /// The element as it was when rasterized.
    source: Element,
    bitmap: Bitmap,
}

#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    entries: HashMap<ElementId, CacheEntry>,
}

impl RenderCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn bitmap(&self, id: &str) -> Option<&Bitmap> {
        self.entries.get(id).map(|e| &e.bitmap)
    }

    /// Bring the cache in line with `elements`: rasterize masked elements
    /// that are new or changed, drop entries for everything else. Returns
    /// how many bitmaps were produced.
    ///
    /// An element that cannot be rasterized falls back to vector drawing.
    pub fn sync(&mut self, elements: &[Element]) -> usize {
        self.entries.retain(|id, _| elements.iter().any(|el| &el.id == id && el.has_mask()));

        let mut rendered = 0;
        for element in elements.iter().filter(|el| el.has_mask()) {
            if self.entries.get(&element.id).is_some_and(|e| &e.source == element) {
                continue;
            }
            match rasterize(element) {
                Ok(Some(bitmap)) => {
                    self.entries.insert(element.id.clone(), CacheEntry { source: element.clone(), bitmap });
                    rendered += 1;
                }
                Ok(None) => {
                    self.entries.remove(&element.id);
                }
                Err(e) => {
                    warn!(id = %element.id, error = %e, "render: rasterize failed, drawing vector");
                    self.entries.remove(&element.id);
                }
            }
        }
        rendered
    }

    /// Draw list in z-order.
    #[must_use]
    pub fn drawables<'a>(&'a self, elements: &'a [Element]) -> Vec<Drawable<'a>> {
        elements
            .iter()
            .map(|el| match self.entries.get(&el.id) {
                Some(entry) if &entry.source == el => Drawable::Bitmap(&entry.bitmap),
                _ => Drawable::Vector(el),
            })
            .collect()
    }
}
