//! Participant side of a drawing room.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`mirror`] | Local copy of the room canvas with optimistic apply |
//! | [`session`] | Pointer and keyboard gestures turned into canvas edits |
//! | [`render`] | Cache of masked-element bitmaps |
//! | [`net`] | WebSocket connection to the coordinator |
//!
//! Everything except [`net`] is synchronous and I/O free, so a UI can drive
//! a [`session::Session`] from its event loop and hand the returned events
//! to a [`net::Connection`].

pub mod mirror;
pub mod net;
pub mod render;
pub mod session;
