//! Deterministic simulation harness for Runwire session testing.
//!
//! Runs the production [`runwire_app::Runtime`] over an in-process driver and
//! backend, so protocol behaviour can be exercised without sockets.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the session
//! invariants; [`Simulation`] checks them after every step.
//!
//! # Model-Based Testing
//!
//! [`Operation`] derives `Arbitrary`, so fuzzers and property tests can drive a
//! [`Simulation`] with arbitrary event sequences.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod operation;
pub mod sim_backend;
pub mod sim_driver;
pub mod simulation;

pub use invariants::{
    CloseOnlyOnOpenTeardown, InertAfterTeardown, Invariant, InvariantRegistry, InvariantResult,
    OutputMirrorsMessages, PhaseFollowsBackend, RunRequiresIdleOpen, SessionSnapshot,
    SessionTrace, Step, Violation,
};
pub use operation::Operation;
pub use sim_backend::{Outcome, Program, SetupFailure, SimBackend};
pub use sim_driver::{Effect, SimDriver, SimDriverError};
pub use simulation::{DEFAULT_PAGE, Simulation, SimulationError};
