//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding an inbound frame.
///
/// All of them are handled by dropping the frame and keeping the session.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("unknown message type: {0:?}")]
    UnknownType(String),

    #[error("message has no data payload")]
    MissingData,
}
