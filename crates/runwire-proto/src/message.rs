//! JSON envelope and typed messages.
//!
//! The envelope is deliberately loose: `msg` defaults to `""` when absent, and
//! extra fields are ignored. Type safety comes from the typed views, which are
//! built by matching on the `type` discriminator exhaustively.
//!
//! # Invariants
//!
//! - Each typed variant maps to exactly one discriminator in [`kind`].
//! - [`ServerMessage::from`] is total: every envelope maps to some variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Discriminator values carried in the envelope's `type` field.
pub mod kind {
    /// Client → server: execute the source in `msg`.
    pub const RUN: &str = "run";
    /// Client → server: session is going away.
    pub const CLOSE: &str = "close";
    /// Server → client: execution began.
    pub const STARTED: &str = "started";
    /// Server → client: execution finished.
    pub const STOPPED: &str = "stopped";
    /// Server → client: standard output chunk.
    pub const STDOUT: &str = "stdout";
    /// Server → client: standard error chunk.
    pub const STDERR: &str = "stderr";
    /// Server → client: backend fault, diagnostic in `msg`.
    pub const ERROR: &str = "error";
}

/// Raw wire object: `{ "type": string, "msg": string }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Message payload. Empty for lifecycle messages.
    #[serde(default)]
    pub msg: String,
}

impl Envelope {
    /// Create an envelope from a discriminator and payload.
    pub fn new(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self { kind: kind.into(), msg: msg.into() }
    }

    /// Serialize to the JSON text sent on the socket.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse JSON text received from the socket.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the text is not a JSON object with a string
    ///   `type` field (and, when present, a string `msg` field).
    pub fn decode(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Output stream a chunk was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl OutputStream {
    /// Wire discriminator for this stream.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => kind::STDOUT,
            Self::Stderr => kind::STDERR,
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages the client sends to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Request execution of the full source text.
    Run {
        /// Source text, sent verbatim.
        source: String,
    },
    /// Best-effort notice that the session is being torn down.
    Close,
}

impl ClientMessage {
    /// Wire discriminator for this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Run { .. } => kind::RUN,
            Self::Close => kind::CLOSE,
        }
    }

    /// Build the wire envelope.
    pub fn to_envelope(&self) -> Envelope {
        match self {
            Self::Run { source } => Envelope::new(kind::RUN, source.clone()),
            Self::Close => Envelope::new(kind::CLOSE, ""),
        }
    }

    /// Serialize to JSON text.
    pub fn encode(&self) -> Result<String> {
        self.to_envelope().encode()
    }

    /// Strictly interpret an envelope as a client message.
    ///
    /// Used by backend-side code (the simulation harness) which must answer
    /// unknown request types with an error.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownType` for any discriminator other than `run`
    ///   and `close`
    pub fn from_envelope(envelope: Envelope) -> Result<Self> {
        match envelope.kind.as_str() {
            kind::RUN => Ok(Self::Run { source: envelope.msg }),
            kind::CLOSE => Ok(Self::Close),
            _ => Err(ProtocolError::UnknownType { kind: envelope.kind }),
        }
    }

    /// Parse and strictly interpret JSON text.
    pub fn decode(raw: &str) -> Result<Self> {
        Self::from_envelope(Envelope::decode(raw)?)
    }
}

/// Messages the backend sends to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Execution began. Payload ignored.
    Started,
    /// Execution finished. Payload ignored.
    Stopped,
    /// Output chunk on one of the program's streams.
    Output {
        /// Stream the chunk belongs to.
        stream: OutputStream,
        /// Chunk text, not necessarily line-terminated.
        text: String,
    },
    /// Backend-reported fault.
    Error {
        /// Human-readable diagnostic.
        diagnostic: String,
    },
    /// Discriminator this client does not understand.
    Unknown {
        /// The unrecognized discriminator.
        kind: String,
        /// Payload, kept for logging.
        msg: String,
    },
}

impl ServerMessage {
    /// Standard output chunk.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self::Output { stream: OutputStream::Stdout, text: text.into() }
    }

    /// Standard error chunk.
    pub fn stderr(text: impl Into<String>) -> Self {
        Self::Output { stream: OutputStream::Stderr, text: text.into() }
    }

    /// Backend fault with a diagnostic.
    pub fn error(diagnostic: impl Into<String>) -> Self {
        Self::Error { diagnostic: diagnostic.into() }
    }

    /// Build the wire envelope.
    pub fn to_envelope(&self) -> Envelope {
        match self {
            Self::Started => Envelope::new(kind::STARTED, ""),
            Self::Stopped => Envelope::new(kind::STOPPED, ""),
            Self::Output { stream, text } => Envelope::new(stream.as_str(), text.clone()),
            Self::Error { diagnostic } => Envelope::new(kind::ERROR, diagnostic.clone()),
            Self::Unknown { kind, msg } => Envelope::new(kind.clone(), msg.clone()),
        }
    }

    /// Serialize to JSON text.
    pub fn encode(&self) -> Result<String> {
        self.to_envelope().encode()
    }

    /// Parse JSON text. Unknown discriminators decode to
    /// [`ServerMessage::Unknown`].
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the text is not a valid envelope
    pub fn decode(raw: &str) -> Result<Self> {
        Envelope::decode(raw).map(Self::from)
    }
}

impl From<Envelope> for ServerMessage {
    fn from(envelope: Envelope) -> Self {
        let Envelope { kind: discriminator, msg } = envelope;
        match discriminator.as_str() {
            kind::STARTED => Self::Started,
            kind::STOPPED => Self::Stopped,
            kind::STDOUT => Self::Output { stream: OutputStream::Stdout, text: msg },
            kind::STDERR => Self::Output { stream: OutputStream::Stderr, text: msg },
            kind::ERROR => Self::Error { diagnostic: msg },
            _ => Self::Unknown { kind: discriminator, msg },
        }
    }
}
