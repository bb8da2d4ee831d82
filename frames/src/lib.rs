//! Wire protocol for the drawing rooms.
//!
//! This crate owns the event model shared by the server, the client library
//! and the CLI. One [`Event`] has two encodings:
//!
//! - text: the JSON envelope `{"event": "<name>", "data": {..}}`, sent as a
//!   WebSocket text message;
//! - binary: a protobuf `WireFrame { event, data }` with the payload carried
//!   as a `google.protobuf.Value`, sent as a WebSocket binary message.
//!
//! Both decode to the same `Event`.

pub mod event;

pub use event::*;

use prost::Message;
use serde_json::{Map, Value};

/// Error returned by the decoders and encoders.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON text was malformed or did not match any known event shape.
    #[error("invalid event json: {0}")]
    Json(#[from] serde_json::Error),
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The frame carried no event name.
    #[error("frame has no event name")]
    MissingEvent,
}

/// Which WebSocket message type an event travels in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Text,
    Binary,
}

/// An encoded event, ready to hand to a socket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

/// Encode `event` with `encoding`.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the event cannot be serialized.
pub fn encode(event: &Event, encoding: Encoding) -> Result<Payload, CodecError> {
    Ok(match encoding {
        Encoding::Text => Payload::Text(encode_text(event)?),
        Encoding::Binary => Payload::Binary(encode_binary(event)?),
    })
}

/// Encode as the JSON envelope.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the event cannot be serialized.
pub fn encode_text(event: &Event) -> Result<String, CodecError> {
    Ok(serde_json::to_string(event)?)
}

/// Decode a JSON envelope.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed JSON, unknown event names, or
/// payloads that do not fit the event.
pub fn decode_text(text: &str) -> Result<Event, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Encode as protobuf bytes.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the event cannot be serialized.
pub fn encode_binary(event: &Event) -> Result<Vec<u8>, CodecError> {
    let envelope = serde_json::to_value(event)?;
    let data = envelope.get("data").map(json_to_proto_value);
    let wire = WireFrame { event: event.name().to_owned(), data };

    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec cannot run out of space.
    wire.encode(&mut out).unwrap_or_default();
    Ok(out)
}

/// Decode protobuf bytes.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes,
/// [`CodecError::MissingEvent`] for an empty event name, and
/// [`CodecError::Json`] when the payload does not fit the named event.
pub fn decode_binary(bytes: &[u8]) -> Result<Event, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    if wire.event.is_empty() {
        return Err(CodecError::MissingEvent);
    }
    let data = wire.data.map_or(Value::Object(Map::new()), |v| proto_to_json_value(&v));
    let mut envelope = Map::new();
    envelope.insert("event".to_owned(), Value::String(wire.event));
    envelope.insert("data".to_owned(), data);
    Ok(serde_json::from_value(Value::Object(envelope))?)
}

fn json_to_proto_value(value: &Value) -> prost_types::Value {
    use prost_types::value::Kind;

    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::Bool(v) => Kind::BoolValue(*v),
        Value::Number(v) => Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => Kind::StringValue(v.clone()),
        Value::Array(v) => Kind::ListValue(prost_types::ListValue { values: v.iter().map(json_to_proto_value).collect() }),
        Value::Object(v) => Kind::StructValue(prost_types::Struct {
            fields: v.iter().map(|(k, v)| (k.clone(), json_to_proto_value(v))).collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    use prost_types::value::Kind;

    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        Kind::NullValue(_) => Value::Null,
        // protobuf numbers are all f64; integral ones come back as JSON
        // integers so integer fields (chat `time`) still deserialize.
        #[allow(clippy::cast_possible_truncation)]
        Kind::NumberValue(v) if v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER => Value::from(*v as i64),
        Kind::NumberValue(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
        Kind::StringValue(v) => Value::String(v.clone()),
        Kind::BoolValue(v) => Value::Bool(*v),
        Kind::StructValue(v) => Value::Object(v.fields.iter().map(|(k, v)| (k.clone(), proto_to_json_value(v))).collect()),
        Kind::ListValue(v) => Value::Array(v.values.iter().map(proto_to_json_value).collect()),
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    event: String,
    #[prost(message, optional, tag = "2")]
    data: Option<prost_types::Value>,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
