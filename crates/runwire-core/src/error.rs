//! Error types for the connection layer.
//!
//! Illegal lifecycle transitions and unusable page locations are the only
//! failures here. Network faults never reach this layer as errors: the
//! transport reports them as events.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors that can occur during connection state machine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Invalid state transition attempted
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: String,
    },

    /// Page location cannot be turned into a socket URL
    #[error("invalid page location: {0}")]
    InvalidLocation(String),
}

impl From<url::ParseError> for ConnectionError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidLocation(err.to_string())
    }
}
