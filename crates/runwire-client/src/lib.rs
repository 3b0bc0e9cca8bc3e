//! Client
//!
//! Action-based run session state machine for the Runwire protocol. Tracks
//! whether a program is executing on the backend, decides when a submit is
//! allowed, and turns inbound messages into render intents.
//!
//! # Architecture
//!
//! The session follows the same Sans-IO pattern as [`runwire_core`]. It
//! receives events ([`SessionEvent`]), processes them through pure state
//! machine logic, and returns actions ([`SessionAction`]) for the caller to
//! execute.
//!
//! # Components
//!
//! - [`RunSession`]: the `Idle`/`Running` state machine
//! - [`RenderIntent`] and [`RenderSink`]: output updates and their consumer
//! - [`SessionEvent`]: events fed into the session
//! - [`SessionAction`]: actions produced by the session
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::WsTransport`]: WebSocket transport with an ordered event
//!   stream

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod event;
mod render;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use event::{LogLevel, SessionAction, SessionEvent, TransportEvent};
pub use render::{OutputLine, OutputLog, RenderIntent, RenderSink};
pub use runwire_core::{Connection, ConnectionState, Url};
pub use runwire_proto::{ClientMessage, OutputStream, ServerMessage};
pub use session::{Phase, RunSession};
