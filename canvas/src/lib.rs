//! Shared canvas model for the collaborative drawing rooms.
//!
//! This crate is pure: no I/O, no async, no logging. Both the coordinating
//! server and every participant link it, so the same mutation applied on
//! either side produces the same element list.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`doc`] | Elements, masks, tools and style settings |
//! | [`geometry`] | Eraser hit-testing, translation and bounds |
//! | [`text`] | Text measurement and word-wrap for text elements |
//! | [`raster`] | Mask compositing into offscreen bitmaps |
//! | [`store`] | Per-room element list with snapshot undo/redo |
//! | [`input`] | Eraser gesture state machine |
//! | [`consts`] | Shared numeric constants (thresholds, padding, font scale) |

pub mod consts;
pub mod doc;
pub mod geometry;
pub mod input;
pub mod raster;
pub mod store;
pub mod text;
