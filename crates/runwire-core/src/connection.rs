//! Connection lifecycle state machine.
//!
//! Tracks the single channel to the execution backend. Pure bookkeeping: the
//! transport performs the I/O and reports what happened, this type decides
//! whether that report is a legal transition and whether sending is allowed.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐ begin_open ┌─────────┐ mark_open ┌──────┐
//! │ Closed │───────────>│ Opening │──────────>│ Open │
//! └────────┘            └─────────┘           └──────┘
//!                            │                    │
//!                            │ mark_closed        │ mark_closed
//!                            ↓                    ↓
//!                       ┌────────────────────────────────┐
//!                       │ Closed (retired, never reused) │
//!                       └────────────────────────────────┘
//! ```
//!
//! A connection that has been opened once can never be opened again. Retrying
//! means constructing a fresh [`Connection`].

use url::Url;

use crate::{endpoint, error::ConnectionError};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No live channel
    Closed,
    /// Connect issued, waiting for the transport to report open
    Opening,
    /// Channel established, messages may be sent
    Open,
}

/// Connection state machine for the socket URL it was built for.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Current state
    state: ConnectionState,
    /// Socket URL this connection targets
    url: Url,
    /// Set once `begin_open` succeeds; a spent connection cannot reopen
    spent: bool,
}

impl Connection {
    /// Create a connection in [`ConnectionState::Closed`] for a socket URL.
    pub fn new(url: Url) -> Self {
        Self { state: ConnectionState::Closed, url, spent: false }
    }

    /// Create a connection for the socket that belongs to a page location.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidLocation` if no socket URL can be derived
    pub fn for_page(page: &Url) -> Result<Self, ConnectionError> {
        Ok(Self::new(endpoint::socket_url(page)?))
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Socket URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether messages may be sent right now.
    pub fn can_send(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Whether this connection has been used and closed, so it can never
    /// open again.
    pub fn is_retired(&self) -> bool {
        self.spent && self.state == ConnectionState::Closed
    }

    /// Record that a connect attempt was issued.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in `Closed`, or if this
    ///   connection was already used
    pub fn begin_open(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Closed || self.spent {
            return Err(self.invalid("begin_open"));
        }

        self.state = ConnectionState::Opening;
        self.spent = true;
        Ok(())
    }

    /// Record that the transport reported the channel open.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` if not in `Opening`
    pub fn mark_open(&mut self) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Opening {
            return Err(self.invalid("mark_open"));
        }

        self.state = ConnectionState::Open;
        Ok(())
    }

    /// Record that the channel closed. Idempotent.
    ///
    /// Closing before any connect attempt also retires the connection.
    pub fn mark_closed(&mut self) {
        self.state = ConnectionState::Closed;
        self.spent = true;
    }

    fn invalid(&self, operation: &str) -> ConnectionError {
        ConnectionError::InvalidState { state: self.state, operation: operation.to_string() }
    }
}
