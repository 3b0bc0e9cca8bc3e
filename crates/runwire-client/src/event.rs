//! Session events and actions.

use runwire_core::Url;
use runwire_proto::ClientMessage;

use crate::render::RenderIntent;

/// Notifications the transport emits, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established.
    Opened,

    /// The connection went away. No automatic reconnect follows.
    Closed,

    /// Raw text payload received from the backend, not yet decoded.
    Message(String),

    /// Transport-level fault, with a human-readable description.
    Error(String),
}

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Forwarding transport notifications in the order they arrived
/// - Forwarding the editor's submit and unload requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Open the connection to the backend.
    ///
    /// Accepted once per session. The caller performs the actual connect
    /// when the session returns [`SessionAction::Connect`].
    Connect,

    /// Notification from the transport.
    Transport(TransportEvent),

    /// User asked to run the given source text.
    Submit {
        /// Full source text, sent verbatim.
        source: String,
    },

    /// The hosting context is going away.
    Unload,
}

impl From<TransportEvent> for SessionEvent {
    fn from(event: TransportEvent) -> Self {
        Self::Transport(event)
    }
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open the socket at this URL. Fire-and-forget: the outcome arrives as
    /// [`TransportEvent::Opened`] or [`TransportEvent::Closed`].
    Connect {
        /// Socket URL derived from the page location.
        url: Url,
    },

    /// Send a message to the backend.
    Send(ClientMessage),

    /// Update the output display.
    Render(RenderIntent),

    /// Log a message.
    Log {
        /// Log level.
        level: LogLevel,
        /// Message to log.
        message: String,
    },

    /// Release the connection. Always the last action of a teardown.
    Disconnect,
}

impl SessionAction {
    pub(crate) fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log { level, message: message.into() }
    }
}

/// Log levels for session actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}
