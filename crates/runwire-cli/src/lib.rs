//! Runwire command-line front end.
//!
//! Terminal implementation of [`runwire_app::Driver`]: the WebSocket
//! transport, a render sink writing to standard output and standard error, and
//! Ctrl-C as the unload signal.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod sink;
pub mod terminal;

pub use error::CliError;
pub use sink::TerminalSink;
pub use terminal::TerminalDriver;

use runwire_client::Url;
use runwire_core::ConnectionError;

/// Parse the page location the socket URL is derived from.
///
/// # Errors
///
/// - `CliError::Location` if the text is not an absolute URL
pub fn page_location(raw: &str) -> Result<Url, CliError> {
    Url::parse(raw).map_err(|e| CliError::Location(ConnectionError::from(e)))
}
