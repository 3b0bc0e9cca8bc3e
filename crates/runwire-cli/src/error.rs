//! Front-end errors.

use std::io;

use runwire_client::transport::TransportError;
use runwire_core::ConnectionError;
use thiserror::Error;

/// Errors raised by the terminal front end.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the source or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The page location cannot be used.
    #[error("location error: {0}")]
    Location(#[from] ConnectionError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
