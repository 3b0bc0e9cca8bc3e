//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload was not a valid JSON envelope.
    #[error("envelope decode failed: {0}")]
    Decode(String),

    /// Envelope could not be serialized.
    #[error("envelope encode failed: {0}")]
    Encode(String),

    /// Envelope carried a `type` this direction does not define.
    ///
    /// Only strict decoders return this. Client-side decoding of server
    /// messages maps unknown types to [`crate::ServerMessage::Unknown`].
    #[error("unknown message type: {kind:?}")]
    UnknownType {
        /// The unrecognized discriminator.
        kind: String,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
