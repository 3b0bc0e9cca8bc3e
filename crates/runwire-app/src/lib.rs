//! Application layer for Runwire
//!
//! Generic runtime that connects the run session to platform I/O, so the same
//! orchestration runs in the terminal front end and in simulation.
//!
//! # Components
//!
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`DriverEvent`] and [`UserIntent`]: what a driver reports

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod event;
mod runtime;

pub use driver::Driver;
pub use event::{DriverEvent, UserIntent};
pub use runtime::{Runtime, RuntimeConfig};
