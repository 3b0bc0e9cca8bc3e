//! Runtime orchestration over a scripted driver.

use std::{
    collections::VecDeque,
    future::Future,
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use runwire_app::{Driver, DriverEvent, Runtime, RuntimeConfig, UserIntent};
use runwire_client::{ClientMessage, Phase, RenderIntent, RunSession, TransportEvent, Url};

/// Everything the driver was asked to do.
#[derive(Debug, Default)]
struct Record {
    connects: Vec<Url>,
    sent: Vec<ClientMessage>,
    rendered: Vec<RenderIntent>,
    stops: usize,
}

struct ScriptedDriver {
    events: VecDeque<DriverEvent>,
    record: Arc<Mutex<Record>>,
    fail_render: bool,
    /// Pend forever once the script is used up, like an idle socket
    hang_when_empty: bool,
}

impl ScriptedDriver {
    fn new(events: Vec<DriverEvent>) -> (Self, Arc<Mutex<Record>>) {
        let record = Arc::new(Mutex::new(Record::default()));
        let driver =
            Self {
            events: events.into(),
            record: Arc::clone(&record),
            fail_render: false,
            hang_when_empty: false,
        };
        (driver, record)
    }
}

impl Driver for ScriptedDriver {
    type Error = io::Error;

    fn poll_event(&mut self) -> impl Future<Output = Result<Option<DriverEvent>, io::Error>> + Send {
        let event = self.events.pop_front();
        let hang = self.hang_when_empty;
        async move {
            match event {
                Some(event) => Ok(Some(event)),
                None if hang => std::future::pending::<Result<Option<DriverEvent>, io::Error>>().await,
                None => Ok(None),
            }
        }
    }

    fn connect(&mut self, url: &Url) -> Result<(), io::Error> {
        self.record.lock().unwrap().connects.push(url.clone());
        Ok(())
    }

    fn send(&mut self, message: ClientMessage) -> Result<(), io::Error> {
        self.record.lock().unwrap().sent.push(message);
        Ok(())
    }

    fn render(&mut self, intent: RenderIntent) -> Result<(), io::Error> {
        if self.fail_render {
            return Err(io::Error::other("display gone"));
        }
        self.record.lock().unwrap().rendered.push(intent);
        Ok(())
    }

    fn stop(&mut self) {
        self.record.lock().unwrap().stops += 1;
    }
}

fn session() -> RunSession {
    RunSession::for_page(&Url::parse("http://localhost:3000/").unwrap()).unwrap()
}

fn inbound(raw: &str) -> DriverEvent {
    TransportEvent::Message(raw.to_string()).into()
}

fn submit(source: &str) -> DriverEvent {
    UserIntent::Submit { source: source.to_string() }.into()
}

fn run_script() -> Vec<DriverEvent> {
    vec![
        TransportEvent::Opened.into(),
        submit("print(\"hi\")"),
        inbound(r#"{"type":"started","msg":""}"#),
        inbound(r#"{"type":"stdout","msg":"hi\n"}"#),
        inbound(r#"{"type":"stopped","msg":""}"#),
    ]
}

#[tokio::test]
async fn exhausted_driver_tears_down() {
    let (driver, record) = ScriptedDriver::new(run_script());
    Runtime::new(driver, session(), RuntimeConfig::default()).run().await.unwrap();

    let record = record.lock().unwrap();
    assert_eq!(record.connects, vec![Url::parse("ws://localhost:3000/ws").unwrap()]);
    assert_eq!(
        record.sent,
        vec![ClientMessage::Run { source: "print(\"hi\")".to_string() }, ClientMessage::Close]
    );
    assert_eq!(record.rendered, vec![RenderIntent::ClearOutput, RenderIntent::stdout("hi\n")]);
    assert_eq!(record.stops, 1);
}

#[tokio::test]
async fn exit_after_run_renders_late_output() {
    let mut events = run_script();
    events.push(inbound(r#"{"type":"stdout","msg":"late"}"#));

    let (driver, record) = ScriptedDriver::new(events);
    let config = RuntimeConfig { exit_after_run: true, exit_on_close: true, ..RuntimeConfig::default() };
    Runtime::new(driver, session(), config).run().await.unwrap();

    let record = record.lock().unwrap();
    assert_eq!(
        record.rendered,
        vec![RenderIntent::ClearOutput, RenderIntent::stdout("hi\n"), RenderIntent::stdout("late")]
    );
    assert_eq!(record.sent.last(), Some(&ClientMessage::Close));
    assert_eq!(record.stops, 1);
}

#[tokio::test]
async fn quiet_period_ends_a_finished_run() {
    let (mut driver, record) = ScriptedDriver::new(run_script());
    driver.hang_when_empty = true;
    let config = RuntimeConfig {
        exit_after_run: true,
        drain_grace: Duration::from_millis(20),
        ..RuntimeConfig::default()
    };

    let run = Runtime::new(driver, session(), config).run();
    tokio::time::timeout(Duration::from_secs(5), run).await.unwrap().unwrap();

    let record = record.lock().unwrap();
    assert_eq!(record.rendered, vec![RenderIntent::ClearOutput, RenderIntent::stdout("hi\n")]);
    assert_eq!(record.sent.last(), Some(&ClientMessage::Close));
    assert_eq!(record.stops, 1);
}

#[test]
fn stopped_starts_draining_without_teardown() {
    let (driver, record) = ScriptedDriver::new(Vec::new());
    let config = RuntimeConfig { exit_after_run: true, ..RuntimeConfig::default() };
    let mut runtime = Runtime::new(driver, session(), config);
    runtime.start().unwrap();

    for event in run_script() {
        assert!(!runtime.step(event).unwrap());
    }
    assert!(runtime.is_draining());

    runtime.step(inbound(r#"{"type":"stderr","msg":"late"}"#)).unwrap();
    assert!(!runtime.is_stopped());
    assert_eq!(record.lock().unwrap().rendered.last(), Some(&RenderIntent::stderr("late")));

    // A new run leaves the drain
    runtime.step(submit("again")).unwrap();
    assert!(!runtime.is_draining());
}

#[tokio::test]
async fn exit_after_run_covers_backend_errors() {
    let events = vec![
        TransportEvent::Opened.into(),
        submit("x"),
        inbound(r#"{"type":"error","msg":"file creation failed"}"#),
        inbound(r#"{"type":"stdout","msg":"late"}"#),
    ];
    let (driver, record) = ScriptedDriver::new(events);
    let config = RuntimeConfig { exit_after_run: true, ..RuntimeConfig::default() };
    Runtime::new(driver, session(), config).run().await.unwrap();

    let record = record.lock().unwrap();
    assert_eq!(
        record.rendered,
        vec![
            RenderIntent::ClearOutput,
            RenderIntent::stderr("file creation failed"),
            RenderIntent::stdout("late"),
        ]
    );
    assert_eq!(record.sent.last(), Some(&ClientMessage::Close));
    assert_eq!(record.stops, 1);
}

#[tokio::test]
async fn exit_on_close_skips_close_message() {
    let events = vec![TransportEvent::Opened.into(), TransportEvent::Closed.into()];
    let (driver, record) = ScriptedDriver::new(events);
    let config = RuntimeConfig { exit_on_close: true, ..RuntimeConfig::default() };
    Runtime::new(driver, session(), config).run().await.unwrap();

    let record = record.lock().unwrap();
    assert!(record.sent.is_empty());
    assert_eq!(record.stops, 1);
}

#[tokio::test]
async fn unload_intent_ends_the_loop() {
    let events = vec![
        TransportEvent::Opened.into(),
        UserIntent::Unload.into(),
        submit("never sent"),
    ];
    let (driver, record) = ScriptedDriver::new(events);
    Runtime::new(driver, session(), RuntimeConfig::default()).run().await.unwrap();

    let record = record.lock().unwrap();
    assert_eq!(record.sent, vec![ClientMessage::Close]);
    assert_eq!(record.stops, 1);
}

#[test]
fn drop_sends_best_effort_close() {
    let (driver, record) = ScriptedDriver::new(Vec::new());
    let mut runtime = Runtime::new(driver, session(), RuntimeConfig::default());
    runtime.start().unwrap();
    runtime.step(TransportEvent::Opened.into()).unwrap();
    drop(runtime);

    let record = record.lock().unwrap();
    assert_eq!(record.sent, vec![ClientMessage::Close]);
    assert_eq!(record.stops, 1);
}

#[test]
fn drop_after_teardown_does_nothing_more() {
    let (driver, record) = ScriptedDriver::new(Vec::new());
    let mut runtime = Runtime::new(driver, session(), RuntimeConfig::default());
    runtime.start().unwrap();
    assert!(runtime.step(UserIntent::Unload.into()).unwrap());
    drop(runtime);

    assert_eq!(record.lock().unwrap().stops, 1);
}

#[tokio::test]
async fn driver_error_still_attempts_close() {
    let (mut driver, record) = ScriptedDriver::new(run_script());
    driver.fail_render = true;

    let result = Runtime::new(driver, session(), RuntimeConfig::default()).run().await;
    assert!(result.is_err());

    // The failed render came from the accepted submit; the run was sent and
    // the drop guard closed the session.
    let record = record.lock().unwrap();
    assert_eq!(
        record.sent,
        vec![ClientMessage::Run { source: "print(\"hi\")".to_string() }, ClientMessage::Close]
    );
    assert_eq!(record.stops, 1);
}

#[test]
fn step_reports_session_state() {
    let (driver, _record) = ScriptedDriver::new(Vec::new());
    let mut runtime = Runtime::new(driver, session(), RuntimeConfig::default());
    runtime.start().unwrap();

    assert!(!runtime.step(TransportEvent::Opened.into()).unwrap());
    runtime.step(submit("x")).unwrap();
    runtime.step(inbound(r#"{"type":"started"}"#)).unwrap();
    assert_eq!(runtime.session().phase(), Phase::Running);
}
