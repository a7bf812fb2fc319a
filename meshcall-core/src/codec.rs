//! Text codec for the signaling wire.
//!
//! Decoding happens in two steps so that an unknown `type` can be told apart
//! from a known type with a broken payload: the former is skipped, the latter
//! is reported.

use crate::error::ProtocolError;
use crate::model::SignalMessage;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Message(SignalMessage),
    Unknown(String),
}

pub fn decode(text: &str) -> Result<Inbound, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_owned();

    if !SignalMessage::KINDS.contains(&kind.as_str()) {
        return Ok(Inbound::Unknown(kind));
    }

    serde_json::from_value(value)
        .map(Inbound::Message)
        .map_err(|source| ProtocolError::Malformed { kind, source })
}

pub fn encode(message: &SignalMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(|source| ProtocolError::Encode {
        kind: message.kind(),
        source,
    })
}
