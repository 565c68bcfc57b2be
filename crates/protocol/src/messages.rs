//! Client/server message envelopes.
//!
//! Every frame is a UTF-8 JSON object of the shape `{"type": ..., "data": ...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ProtocolError;

/// An intent sent by a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Join { name: String },
    Move { x: f64, y: f64 },
    Split,
    Eject,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct JoinData {
    name: String,
}

#[derive(Deserialize)]
struct MoveData {
    x: f64,
    y: f64,
}

impl ClientMessage {
    /// Parse a text frame.
    ///
    /// Unknown types and malformed payloads are errors; callers drop the
    /// frame and keep the session alive.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text)?;
        match envelope.kind.as_str() {
            "join" => {
                let data = envelope.data.ok_or(ProtocolError::MissingData)?;
                let JoinData { name } = serde_json::from_value(data)?;
                Ok(ClientMessage::Join { name })
            }
            "move" => {
                let data = envelope.data.ok_or(ProtocolError::MissingData)?;
                let MoveData { x, y } = serde_json::from_value(data)?;
                Ok(ClientMessage::Move { x, y })
            }
            "split" => Ok(ClientMessage::Split),
            "eject" => Ok(ClientMessage::Eject),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

/// A message sent by the server outside of the event stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One-shot reply to `join`.
    Init(InitData),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitData {
    pub player_id: Uuid,
    pub world_size: WorldSize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct WorldSize {
    pub width: f64,
    pub height: f64,
}
