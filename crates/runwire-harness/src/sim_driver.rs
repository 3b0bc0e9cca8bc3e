//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as `TerminalDriver` but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`runwire_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Without a backend, events are injected by the test. In loopback mode every
//! sent message is answered by a [`SimBackend`] and the replies are queued as
//! transport messages.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use runwire_app::{Driver, DriverEvent, UserIntent};
use runwire_client::{ClientMessage, OutputLog, RenderIntent, TransportEvent, Url};

use crate::sim_backend::SimBackend;

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Observable side effect requested by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Connect issued.
    Connect(Url),
    /// Message handed to the transport.
    Send(ClientMessage),
    /// Render intent applied.
    Render(RenderIntent),
    /// Connection released.
    Stop,
}

/// Shared state for event injection.
///
/// This allows injection from outside async contexts.
#[derive(Debug, Default)]
struct SharedState {
    pending_events: VecDeque<DriverEvent>,
    effects: Vec<Effect>,
    output: OutputLog,
    backend: Option<SimBackend>,
    submit_on_open: Option<String>,
    connected: bool,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Clones share state, so a test can keep a handle after moving the driver
/// into a [`runwire_app::Runtime`].
#[derive(Debug, Clone, Default)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
}

impl SimDriver {
    /// Create a driver fed only by injected events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver answered by an in-process backend.
    pub fn loopback(backend: SimBackend) -> Self {
        let driver = Self::new();
        driver.lock().backend = Some(backend);
        driver
    }

    /// Submit `source` right after the loopback connection opens, the way
    /// the terminal front end does.
    #[must_use]
    pub fn with_submit_on_open(self, source: impl Into<String>) -> Self {
        self.lock().submit_on_open = Some(source.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inject a driver event for processing.
    pub fn inject(&self, event: impl Into<DriverEvent>) {
        self.lock().pending_events.push_back(event.into());
    }

    /// Inject a raw text payload from the backend.
    pub fn inject_message(&self, raw: impl Into<String>) {
        self.inject(TransportEvent::Message(raw.into()));
    }

    /// Inject a user submit.
    pub fn inject_submit(&self, source: impl Into<String>) {
        self.inject(UserIntent::Submit { source: source.into() });
    }

    /// Take the next pending event without going through the runtime.
    pub fn next_pending(&self) -> Option<DriverEvent> {
        self.lock().pending_events.pop_front()
    }

    /// Check if there are pending events to process.
    pub fn has_pending(&self) -> bool {
        !self.lock().pending_events.is_empty()
    }

    /// Take all effects recorded since the last call.
    pub fn take_effects(&self) -> Vec<Effect> {
        std::mem::take(&mut self.lock().effects)
    }

    /// What the display currently shows.
    pub fn output(&self) -> OutputLog {
        self.lock().output.clone()
    }

    /// Sources the loopback backend received.
    pub fn backend_runs(&self) -> Vec<String> {
        self.lock().backend.as_ref().map(|b| b.runs().to_vec()).unwrap_or_default()
    }

    /// Whether the loopback backend received `close`.
    pub fn backend_closed(&self) -> bool {
        self.lock().backend.as_ref().is_some_and(SimBackend::is_closed)
    }

    /// Whether the driver was stopped.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<DriverEvent>, SimDriverError>> + Send {
        let event = self.next_pending();
        async move { Ok(event) }
    }

    fn connect(&mut self, url: &Url) -> Result<(), SimDriverError> {
        let mut state = self.lock();
        if state.stopped {
            return Err(SimDriverError("connect after stop".to_string()));
        }

        state.effects.push(Effect::Connect(url.clone()));
        if state.backend.is_some() {
            state.connected = true;
            state.pending_events.push_back(TransportEvent::Opened.into());
            if let Some(source) = state.submit_on_open.take() {
                state.pending_events.push_back(UserIntent::Submit { source }.into());
            }
        }
        Ok(())
    }

    fn send(&mut self, message: ClientMessage) -> Result<(), SimDriverError> {
        let mut state = self.lock();
        if state.stopped {
            return Err(SimDriverError("send after stop".to_string()));
        }

        state.effects.push(Effect::Send(message.clone()));

        let SharedState { backend, pending_events, connected, .. } = &mut *state;
        if let Some(backend) = backend.as_mut()
            && *connected
        {
            for reply in backend.handle(message) {
                match reply.encode() {
                    Ok(raw) => pending_events.push_back(TransportEvent::Message(raw).into()),
                    Err(e) => tracing::warn!(error = %e, "backend reply not encodable"),
                }
            }
            if backend.is_closed() {
                *connected = false;
                pending_events.push_back(TransportEvent::Closed.into());
            }
        }
        Ok(())
    }

    fn render(&mut self, intent: RenderIntent) -> Result<(), SimDriverError> {
        let mut state = self.lock();
        state.effects.push(Effect::Render(intent.clone()));
        match intent.apply(&mut state.output) {
            Ok(()) => Ok(()),
            Err(never) => match never {},
        }
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        state.effects.push(Effect::Stop);
        state.stopped = true;
        state.connected = false;
    }
}
