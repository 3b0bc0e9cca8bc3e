//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! The simulation records each processed event into a [`SessionTrace`], then
//! runs registered [`Invariant`] checks against it. Checks only look at what
//! is observable from outside the session: state snapshots and the effects
//! the driver was asked to perform.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.check_all(simulation.trace())?;
//! ```

mod checks;
mod trace;

pub use checks::{
    CloseOnlyOnOpenTeardown, InertAfterTeardown, OutputMirrorsMessages, PhaseFollowsBackend,
    RunRequiresIdleOpen,
};
pub use trace::{SessionSnapshot, SessionTrace, Step};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against a recorded trace.
///
/// Invariants are behavioral properties that must always hold.
/// They capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the trace.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, trace: &SessionTrace) -> InvariantResult;

    /// Build a violation for step `index`.
    fn violation(&self, index: usize, message: String) -> Violation {
        Violation { invariant: self.name(), message: format!("step {index}: {message}") }
    }
}

/// Registry of invariants to check.
///
/// Collects multiple invariants and runs them all against a trace.
/// Use [`InvariantRegistry::standard()`] for the session invariants.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.invariants.iter().map(|inv| inv.name())).finish()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard session invariants.
    ///
    /// Includes:
    /// - [`PhaseFollowsBackend`]: only backend messages and close move the phase
    /// - [`RunRequiresIdleOpen`]: `run` is sent only for an accepted submit
    /// - [`OutputMirrorsMessages`]: output chunks render unchanged, in order
    /// - [`CloseOnlyOnOpenTeardown`]: `close` is sent once, at teardown
    /// - [`InertAfterTeardown`]: nothing happens after teardown
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(PhaseFollowsBackend);
        registry.add(RunRequiresIdleOpen);
        registry.add(OutputMirrorsMessages);
        registry.add(CloseOnlyOnOpenTeardown);
        registry.add(InertAfterTeardown);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the trace.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, trace: &SessionTrace) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(trace).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on the first failure.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, trace: &SessionTrace, context: &str) {
        if let Err(violations) = self.check_all(trace) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
