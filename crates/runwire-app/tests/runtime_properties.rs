//! Property-based tests for the runtime.
//!
//! Arbitrary driver scripts must reach the display unchanged: finishing a run
//! never cuts off output that is still arriving.

use std::{
    future::{Future, ready},
    io,
};

use proptest::prelude::*;
use runwire_app::{Driver, DriverEvent, Runtime, RuntimeConfig, UserIntent};
use runwire_client::{
    ClientMessage, OutputStream, RenderIntent, RunSession, ServerMessage, TransportEvent, Url,
};

/// Driver that only records what it rendered.
#[derive(Default)]
struct RecordingDriver {
    rendered: Vec<RenderIntent>,
}

impl Driver for RecordingDriver {
    type Error = io::Error;

    fn poll_event(&mut self) -> impl Future<Output = Result<Option<DriverEvent>, io::Error>> + Send {
        ready(Ok(None))
    }

    fn connect(&mut self, _url: &Url) -> Result<(), io::Error> {
        Ok(())
    }

    fn send(&mut self, _message: ClientMessage) -> Result<(), io::Error> {
        Ok(())
    }

    fn render(&mut self, intent: RenderIntent) -> Result<(), io::Error> {
        self.rendered.push(intent);
        Ok(())
    }

    fn stop(&mut self) {}
}

fn backend(message: &ServerMessage) -> DriverEvent {
    TransportEvent::Message(message.encode().unwrap()).into()
}

fn arbitrary_event() -> impl Strategy<Value = DriverEvent> {
    prop_oneof![
        2 => "[a-z]{1,6}".prop_map(|source| UserIntent::Submit { source }.into()),
        2 => Just(backend(&ServerMessage::Started)),
        2 => Just(backend(&ServerMessage::Stopped)),
        3 => "[a-z]{0,6}".prop_map(|text| backend(&ServerMessage::stdout(text))),
        3 => "[a-z]{0,6}".prop_map(|text| backend(&ServerMessage::stderr(text))),
        1 => "[a-z ]{0,12}".prop_map(|diagnostic| backend(&ServerMessage::error(diagnostic))),
    ]
}

#[test]
fn prop_finished_runs_keep_rendering_late_output() {
    proptest!(|(events in prop::collection::vec(arbitrary_event(), 0..48))| {
        let session =
            RunSession::for_page(&Url::parse("http://localhost:3000/").unwrap()).unwrap();
        let config = RuntimeConfig { exit_after_run: true, exit_on_close: true, ..RuntimeConfig::default() };
        let mut runtime = Runtime::new(RecordingDriver::default(), session, config);
        runtime.start().unwrap();
        runtime.step(TransportEvent::Opened.into()).unwrap();

        let mut expected = Vec::new();
        for event in events {
            if let DriverEvent::Transport(TransportEvent::Message(raw)) = &event {
                match ServerMessage::decode(raw).unwrap() {
                    ServerMessage::Output { stream, text } => {
                        expected.push((stream, text));
                    },
                    ServerMessage::Error { diagnostic } => {
                        expected.push((OutputStream::Stderr, diagnostic));
                    },
                    _ => {},
                }
            }

            // PROPERTY: only the quiet period or the connection ends a session
            prop_assert!(!runtime.step(event).unwrap());
        }

        // PROPERTY: every chunk reached the display, in arrival order
        let rendered: Vec<_> = runtime
            .driver()
            .rendered
            .iter()
            .filter_map(|intent| match intent {
                RenderIntent::AppendLine { stream, text } => Some((*stream, text.clone())),
                RenderIntent::ClearOutput => None,
            })
            .collect();
        prop_assert_eq!(rendered, expected);
    });
}
