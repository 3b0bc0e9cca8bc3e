//! Fuzz target for the run session state machine
//!
//! Replays arbitrary operation sequences through the simulation harness.
//!
//! # Strategy
//!
//! - Transport churn: open, close and faults at any point
//! - Backend messages: lifecycle, output, errors, unknown types, garbage
//! - User actions: submits (including empty ones) and unload, in any phase
//!
//! # Invariants
//!
//! - Every standard session invariant holds after every step
//! - NEVER panic

#![no_main]

use libfuzzer_sys::fuzz_target;
use runwire_harness::{Operation, SimDriver, Simulation};

fuzz_target!(|ops: Vec<Operation>| {
    let Ok(mut simulation) = Simulation::new(SimDriver::new()) else {
        return;
    };
    if let Err(e) = simulation.start() {
        panic!("connect step failed: {e}");
    }

    for op in ops {
        if let Err(e) = simulation.apply_operation(op) {
            panic!("{e}");
        }
    }
});
