//! Arbitrary operations for model-based and fuzz testing.
//!
//! An [`Operation`] is one thing that can happen to a session: the transport
//! changes state, the backend sends something, or the user acts. Sequences of
//! operations are generated by `arbitrary` (fuzzing) or `proptest` and replayed
//! through a [`Simulation`](crate::Simulation).

use arbitrary::Arbitrary;
use runwire_app::{DriverEvent, UserIntent};
use runwire_client::{OutputStream, ServerMessage, TransportEvent};

/// One step applied to a session under test.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Transport reports the connection open.
    Open,
    /// Transport reports the connection closed.
    Close,
    /// Transport reports a fault.
    TransportError,
    /// Backend reports the run started.
    Started,
    /// Backend reports the run stopped.
    Stopped,
    /// Backend sends an output chunk.
    Output {
        /// `true` for stdout, `false` for stderr.
        stdout: bool,
        /// Chunk text.
        text: String,
    },
    /// Backend reports a fault.
    BackendError(String),
    /// Backend sends a discriminator the client does not know.
    Unknown(String),
    /// Backend sends something that is not an envelope.
    Garbage(String),
    /// User submits source text.
    Submit(String),
    /// User leaves.
    Unload,
}

impl Operation {
    /// Driver event that carries this operation.
    pub fn into_event(self) -> DriverEvent {
        match self {
            Self::Open => TransportEvent::Opened.into(),
            Self::Close => TransportEvent::Closed.into(),
            Self::TransportError => TransportEvent::Error("simulated fault".to_string()).into(),
            Self::Started => backend(&ServerMessage::Started),
            Self::Stopped => backend(&ServerMessage::Stopped),
            Self::Output { stdout, text } => {
                let stream = if stdout { OutputStream::Stdout } else { OutputStream::Stderr };
                backend(&ServerMessage::Output { stream, text })
            },
            Self::BackendError(diagnostic) => backend(&ServerMessage::Error { diagnostic }),
            Self::Unknown(kind) => backend(&ServerMessage::Unknown {
                kind: format!("x-{kind}"),
                msg: String::new(),
            }),
            Self::Garbage(raw) => TransportEvent::Message(raw).into(),
            Self::Submit(source) => UserIntent::Submit { source }.into(),
            Self::Unload => UserIntent::Unload.into(),
        }
    }
}

fn backend(message: &ServerMessage) -> DriverEvent {
    match message.encode() {
        Ok(raw) => TransportEvent::Message(raw).into(),
        Err(e) => TransportEvent::Error(e.to_string()).into(),
    }
}
