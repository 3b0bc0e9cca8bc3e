//! Runwire core
//!
//! Pure, I/O-free pieces shared by the session and the transport:
//!
//! - [`connection`]: lifecycle state machine for the single backend channel
//! - [`endpoint`]: socket URL derivation from the page location
//! - [`error`]: connection error types

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod endpoint;
pub mod error;

pub use connection::{Connection, ConnectionState};
pub use endpoint::{SOCKET_PATH_SUFFIX, socket_url};
pub use error::ConnectionError;
pub use url::Url;
