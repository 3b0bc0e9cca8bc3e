//! Events a driver reports to the runtime.

use runwire_client::{SessionEvent, TransportEvent};

/// Requests coming from the editor side of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// Run the given source text.
    Submit {
        /// Full source text.
        source: String,
    },

    /// The application is going away.
    Unload,
}

/// Input polled from a [`Driver`](crate::Driver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// Notification from the transport.
    Transport(TransportEvent),

    /// Request from the user.
    Intent(UserIntent),
}

impl From<DriverEvent> for SessionEvent {
    fn from(event: DriverEvent) -> Self {
        match event {
            DriverEvent::Transport(event) => Self::Transport(event),
            DriverEvent::Intent(UserIntent::Submit { source }) => Self::Submit { source },
            DriverEvent::Intent(UserIntent::Unload) => Self::Unload,
        }
    }
}

impl From<TransportEvent> for DriverEvent {
    fn from(event: TransportEvent) -> Self {
        Self::Transport(event)
    }
}

impl From<UserIntent> for DriverEvent {
    fn from(intent: UserIntent) -> Self {
        Self::Intent(intent)
    }
}
