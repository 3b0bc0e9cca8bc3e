//! Recorded session history for invariant checking.
//!
//! Every processed event becomes a [`Step`]: the session's observable state
//! before and after, plus the effects the driver was asked to perform.
//! Invariants operate on the whole trace, so properties spanning several
//! steps can be checked too.

use runwire_client::{ConnectionState, Phase, RunSession, SessionEvent};

use crate::sim_driver::Effect;

/// Observable state of a run session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Connection state.
    pub connection: ConnectionState,
    /// Pending submission, if any.
    pub pending: Option<String>,
    /// Whether teardown happened.
    pub torn_down: bool,
}

impl SessionSnapshot {
    /// Capture the observable state of a session.
    pub fn of(session: &RunSession) -> Self {
        Self {
            phase: session.phase(),
            connection: session.connection_state(),
            pending: session.pending_submission().map(str::to_string),
            torn_down: session.is_torn_down(),
        }
    }
}

/// One processed event.
#[derive(Debug, Clone)]
pub struct Step {
    /// Event fed into the session.
    pub event: SessionEvent,
    /// State before the event.
    pub before: SessionSnapshot,
    /// State after the event.
    pub after: SessionSnapshot,
    /// Effects requested while handling the event, in order.
    pub effects: Vec<Effect>,
}

/// Ordered history of steps.
#[derive(Debug, Clone, Default)]
pub struct SessionTrace {
    steps: Vec<Step>,
}

impl SessionTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// All steps, oldest first.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Most recent step.
    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
