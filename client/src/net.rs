//! WebSocket connection to the coordinator.
//!
//! DESIGN
//! ======
//! A thin wrapper over a tokio-tungstenite stream that speaks [`Event`]s.
//! Outbound events use the connection's [`Encoding`]; inbound frames are
//! decoded whichever way they arrive. Control frames are skipped.
//!
//! A frame that fails to decode is returned as an error but does not close
//! the connection, so callers may log it and keep reading.

#[cfg(test)]
#[path = "net_test.rs"]
mod net_test;

use std::time::Duration;

use frames::{CodecError, Encoding, Event, Payload};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("frame codec failed: {0}")]
    Codec(#[from] CodecError),
    #[error("websocket closed")]
    Closed,
    #[error("timed out waiting for an event")]
    Timeout,
}

impl From<tokio_tungstenite::tungstenite::Error> for ConnectError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(error))
    }
}

/// Turn an `http(s)://host[:port]` base URL into the event channel URL.
///
/// # Errors
///
/// Returns [`ConnectError::InvalidBaseUrl`] for any other scheme.
pub fn ws_url(base_url: &str) -> Result<String, ConnectError> {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/api/ws"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/api/ws"));
    }
    if base.starts_with("ws://") || base.starts_with("wss://") {
        return Ok(base.to_owned());
    }
    Err(ConnectError::InvalidBaseUrl(base_url.to_owned()))
}

/// Encode `event` as a WebSocket message.
///
/// # Errors
///
/// Returns [`CodecError`] if the event cannot be serialized.
pub fn to_message(event: &Event, encoding: Encoding) -> Result<Message, CodecError> {
    Ok(match frames::encode(event, encoding)? {
        Payload::Text(text) => Message::Text(text.into()),
        Payload::Binary(bytes) => Message::Binary(bytes.into()),
    })
}

/// Decode a data frame. Control frames yield `None`.
#[must_use]
pub fn from_message(message: &Message) -> Option<Result<Event, CodecError>> {
    match message {
        Message::Text(text) => Some(frames::decode_text(text.as_str())),
        Message::Binary(bytes) => Some(frames::decode_binary(bytes)),
        _ => None,
    }
}

pub struct Connection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    encoding: Encoding,
}

impl Connection {
    /// Open the event channel at `url` (see [`ws_url`]).
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Ws`] if the handshake fails.
    pub async fn connect(url: &str, encoding: Encoding) -> Result<Self, ConnectError> {
        let (stream, _) = connect_async(url).await?;
        info!(%url, ?encoding, "net: connected");
        Ok(Self { stream, encoding })
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// # Errors
    ///
    /// Returns an error if encoding or the socket write fails.
    pub async fn send(&mut self, event: &Event) -> Result<(), ConnectError> {
        let message = to_message(event, self.encoding)?;
        self.stream.send(message).await?;
        debug!(event = event.name(), "net: sent");
        Ok(())
    }

    /// Send several events in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failed send.
    pub async fn send_all(&mut self, events: &[Event]) -> Result<(), ConnectError> {
        for event in events {
            self.send(event).await?;
        }
        Ok(())
    }

    /// Wait for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Closed`] when the peer closes, or
    /// [`ConnectError::Codec`] for a frame that does not decode.
    pub async fn recv(&mut self) -> Result<Event, ConnectError> {
        loop {
            let Some(message) = self.stream.next().await else {
                return Err(ConnectError::Closed);
            };
            let message = message?;
            if let Message::Close(_) = message {
                return Err(ConnectError::Closed);
            }
            if let Some(decoded) = from_message(&message) {
                let event = decoded?;
                debug!(event = event.name(), "net: received");
                return Ok(event);
            }
        }
    }

    /// [`Connection::recv`] bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::Timeout`] if nothing arrives in time.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Event, ConnectError> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .map_err(|_| ConnectError::Timeout)?
    }

    /// Read events until one satisfies `pred`, returning it.
    ///
    /// # Errors
    ///
    /// Propagates receive errors, including the per-event `timeout`.
    pub async fn recv_until(
        &mut self,
        timeout: Duration,
        mut pred: impl FnMut(&Event) -> bool,
    ) -> Result<Event, ConnectError> {
        loop {
            let event = self.recv_timeout(timeout).await?;
            if pred(&event) {
                return Ok(event);
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the close handshake cannot be sent.
    pub async fn close(mut self) -> Result<(), ConnectError> {
        self.stream.close(None).await?;
        info!("net: closed");
        Ok(())
    }
}
