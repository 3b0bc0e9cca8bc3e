//! Runwire wire protocol
//!
//! Every message on the run-session socket is a JSON object with exactly two
//! string fields:
//!
//! ```text
//! { "type": "<discriminator>", "msg": "<payload>" }
//! ```
//!
//! [`Envelope`] is that raw object. [`ClientMessage`] and [`ServerMessage`]
//! are the typed views for each direction. Decoding a server message never
//! fails on an unrecognized `type`: it yields [`ServerMessage::Unknown`] so the
//! session can log and drop it.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod message;

pub use errors::{ProtocolError, Result};
pub use message::{ClientMessage, Envelope, OutputStream, ServerMessage, kind};
