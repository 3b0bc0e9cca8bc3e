//! Simulation harness around the generic runtime.
//!
//! [`Simulation`] runs the production [`Runtime`] over a [`SimDriver`],
//! records every processed event into a [`SessionTrace`] and checks the
//! registered invariants after each step.

use runwire_app::{DriverEvent, Runtime, RuntimeConfig};
use runwire_client::{OutputLog, RunSession, SessionEvent, Url};
use thiserror::Error;

use crate::{
    invariants::{InvariantRegistry, SessionSnapshot, SessionTrace, Step, Violation},
    operation::Operation,
    sim_driver::{SimDriver, SimDriverError},
};

/// Page location simulated sessions are created for.
pub const DEFAULT_PAGE: &str = "http://localhost:3000/";

/// Error type for simulation steps.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The driver refused an effect.
    #[error(transparent)]
    Driver(#[from] SimDriverError),

    /// One or more invariants failed after a step.
    #[error("invariant violations: {}", join(.0))]
    Invariants(Vec<Violation>),

    /// The simulated page location is unusable.
    #[error("simulation setup failed: {0}")]
    Setup(String),
}

fn join(violations: &[Violation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Runtime, driver handle and trace for one simulated session.
pub struct Simulation {
    runtime: Runtime<SimDriver>,
    driver: SimDriver,
    trace: SessionTrace,
    invariants: InvariantRegistry,
}

impl Simulation {
    /// Create a simulation for [`DEFAULT_PAGE`] checking the standard
    /// invariants.
    pub fn new(driver: SimDriver) -> Result<Self, SimulationError> {
        let page = Url::parse(DEFAULT_PAGE).map_err(|e| SimulationError::Setup(e.to_string()))?;
        let session =
            RunSession::for_page(&page).map_err(|e| SimulationError::Setup(e.to_string()))?;
        Ok(Self {
            runtime: Runtime::new(driver.clone(), session, RuntimeConfig::default()),
            driver,
            trace: SessionTrace::new(),
            invariants: InvariantRegistry::standard(),
        })
    }

    /// Replace the invariants checked after each step.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = registry;
        self
    }

    /// Issue the connect.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        let before = SessionSnapshot::of(self.runtime.session());
        self.runtime.start()?;
        self.record(SessionEvent::Connect, before)
    }

    /// Process one event.
    pub fn apply(&mut self, event: DriverEvent) -> Result<(), SimulationError> {
        let before = SessionSnapshot::of(self.runtime.session());
        let recorded = SessionEvent::from(event.clone());
        self.runtime.step(event)?;
        self.record(recorded, before)
    }

    /// Process one operation.
    pub fn apply_operation(&mut self, operation: Operation) -> Result<(), SimulationError> {
        self.apply(operation.into_event())
    }

    /// Process queued driver events until none are left.
    ///
    /// In loopback mode this delivers every backend reply.
    pub fn run_pending(&mut self) -> Result<(), SimulationError> {
        while let Some(event) = self.driver.next_pending() {
            self.apply(event)?;
        }
        Ok(())
    }

    /// Driver handle, sharing state with the runtime's driver.
    pub fn driver(&self) -> &SimDriver {
        &self.driver
    }

    /// The session under test.
    pub fn session(&self) -> &RunSession {
        self.runtime.session()
    }

    /// Steps recorded so far.
    pub fn trace(&self) -> &SessionTrace {
        &self.trace
    }

    /// What the display currently shows.
    pub fn output(&self) -> OutputLog {
        self.driver.output()
    }

    fn record(&mut self, event: SessionEvent, before: SessionSnapshot) -> Result<(), SimulationError> {
        let after = SessionSnapshot::of(self.runtime.session());
        let effects = self.driver.take_effects();
        tracing::trace!(?event, ?before, ?after, effects = effects.len(), "step");

        self.trace.push(Step { event, before, after, effects });
        self.invariants.check_all(&self.trace).map_err(SimulationError::Invariants)
    }
}
