//! Local mirror of one room's canvas.
//!
//! SYSTEM CONTEXT
//! ==============
//! The mirror applies the participant's own edits immediately and returns
//! the event announcing them; the coordinator relays that event to everyone
//! else and never echoes it back. Edits from peers arrive as events and go
//! through [`LocalMirror::apply_remote`]. Both paths funnel into the same
//! [`CanvasStore::apply`], so a mirror and the room converge once every
//! event has been delivered.

#[cfg(test)]
#[path = "mirror_test.rs"]
mod mirror_test;

use canvas::doc::{Element, ToolSettings};
use canvas::store::{CanvasStore, Mutation};
use frames::Event;

/// What an inbound event did to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteApply {
    /// A canvas event was applied. `changed` is false for no-ops.
    Applied { changed: bool },
    /// `loading-canvas` replaced the whole store.
    Loaded,
    /// Another room's event, or not a canvas event.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct LocalMirror {
    room_id: String,
    store: CanvasStore,
    settings: ToolSettings,
}

impl LocalMirror {
    #[must_use]
    pub fn new(room_id: impl Into<String>) -> Self {
        Self { room_id: room_id.into(), store: CanvasStore::new(), settings: ToolSettings::default() }
    }

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    #[must_use]
    pub fn store(&self) -> &CanvasStore {
        &self.store
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        self.store.elements()
    }

    #[must_use]
    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    /// Apply a local edit now and return the event that announces it.
    pub fn apply_local(&mut self, mutation: &Mutation) -> Event {
        self.store.apply(mutation);
        Event::from_mutation(&self.room_id, mutation)
    }

    /// Apply an event received from the coordinator. The participant's own
    /// settings play no part, so the mirror builds what the room built.
    pub fn apply_remote(&mut self, event: &Event) -> RemoteApply {
        if event.room_id() != Some(self.room_id.as_str()) {
            return RemoteApply::Ignored;
        }
        if let Event::LoadingCanvas(loading) = event {
            self.store.hydrate(loading.snapshot.clone());
            return RemoteApply::Loaded;
        }
        match event.to_mutation() {
            Some(mutation) => RemoteApply::Applied { changed: self.store.apply(&mutation) },
            None => RemoteApply::Ignored,
        }
    }
}
