//! Property-based tests: arbitrary operation sequences never violate the
//! standard session invariants.

use proptest::prelude::*;
use runwire_client::Phase;
use runwire_harness::{Operation, Program, SimBackend, SimDriver, Simulation};

fn arbitrary_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        2 => Just(Operation::Open),
        1 => Just(Operation::Close),
        1 => Just(Operation::TransportError),
        3 => Just(Operation::Started),
        3 => Just(Operation::Stopped),
        3 => (any::<bool>(), "[a-z\n]{0,8}").prop_map(|(stdout, text)| Operation::Output { stdout, text }),
        1 => "[a-z ]{0,12}".prop_map(Operation::BackendError),
        1 => "[a-z]{1,6}".prop_map(Operation::Unknown),
        1 => ".{0,16}".prop_map(Operation::Garbage),
        4 => "[a-z()]{0,8}".prop_map(Operation::Submit),
        1 => Just(Operation::Unload),
    ]
}

#[test]
fn prop_injected_sequences_hold_invariants() {
    proptest!(|(ops in prop::collection::vec(arbitrary_operation(), 0..48))| {
        let mut simulation = Simulation::new(SimDriver::new()).unwrap();
        simulation.start().unwrap();

        for op in ops {
            if let Err(e) = simulation.apply_operation(op) {
                prop_assert!(false, "{e}");
            }
        }
    });
}

#[test]
fn prop_loopback_runs_always_finish_idle() {
    proptest!(|(sources in prop::collection::vec("[a-z]{1,8}", 1..6), chunks in prop::collection::vec("[a-z]{0,6}", 0..4))| {
        let backend = SimBackend::new().with_program(Program::printing(chunks));
        let mut simulation = Simulation::new(SimDriver::loopback(backend)).unwrap();
        simulation.start().unwrap();
        simulation.run_pending().unwrap();

        for source in &sources {
            simulation.apply_operation(Operation::Submit(source.clone())).unwrap();
            simulation.run_pending().unwrap();
            prop_assert_eq!(simulation.session().phase(), Phase::Idle);
        }

        // PROPERTY: the backend saw every submit, verbatim and in order
        prop_assert_eq!(simulation.driver().backend_runs(), sources);
    });
}
