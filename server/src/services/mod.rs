//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own room state and transcript storage so route handlers
//! can stay focused on protocol translation. Services push outbound events
//! into per-connection queues; they never touch a socket.

pub mod canvas;
pub mod chat;
pub mod room;

/// Errors that surface on the wire carry a stable, grepable code.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
