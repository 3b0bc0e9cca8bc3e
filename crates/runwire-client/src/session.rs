//! Run session state machine.
//!
//! The single stateful authority of the protocol. Owns the [`Connection`]
//! bookkeeping and the coarse execution phase, and decides for every event
//! what must be sent, rendered and logged.
//!
//! # State Machine
//!
//! ```text
//!            submit (sends run, phase unchanged)
//!               ┌───────┐
//!               │       ↓
//!          ┌─────────┐ started ┌─────────┐
//!   ──────>│  Idle   │────────>│ Running │
//!          └─────────┘<────────└─────────┘
//!                stopped | error | closed
//! ```
//!
//! The backend is authoritative: a submit only records a pending submission,
//! and the phase flips to `Running` when `started` arrives. `started`,
//! `stopped` and `error` apply from any phase.
//!
//! After [`SessionEvent::Unload`] the session is inert and every further event
//! yields no actions.

use runwire_core::{Connection, ConnectionError, ConnectionState, Url};
use runwire_proto::{ClientMessage, ServerMessage};

use crate::{
    event::{LogLevel, SessionAction, SessionEvent, TransportEvent},
    render::RenderIntent,
};

/// Coarse execution state as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// No program is executing; a submit may be accepted.
    #[default]
    Idle,
    /// The backend reported `started` and has not finished yet.
    Running,
}

/// Session state machine for one connection to the execution backend.
#[derive(Debug, Clone)]
pub struct RunSession {
    /// Lifecycle of the single backend channel
    connection: Connection,
    /// Current phase
    phase: Phase,
    /// Source of the last accepted submit, until the backend answers
    pending_submission: Option<String>,
    /// Set by unload; nothing is processed afterwards
    torn_down: bool,
}

impl RunSession {
    /// Create an idle session over a closed connection.
    pub fn new(connection: Connection) -> Self {
        Self { connection, phase: Phase::Idle, pending_submission: None, torn_down: false }
    }

    /// Create a session for the socket that belongs to a page location.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidLocation` if no socket URL can be derived
    pub fn for_page(page: &Url) -> Result<Self, ConnectionError> {
        Ok(Self::new(Connection::for_page(page)?))
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Source of the last accepted submit that has not been answered yet.
    pub fn pending_submission(&self) -> Option<&str> {
        self.pending_submission.as_deref()
    }

    /// Current connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Connection bookkeeping
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Whether unload has been processed.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Whether a non-empty submit would be accepted right now.
    pub fn can_submit(&self) -> bool {
        !self.torn_down && self.phase == Phase::Idle && self.connection.can_send()
    }

    /// Process an event and return the actions to execute, in order.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        if self.torn_down {
            return Vec::new();
        }

        match event {
            SessionEvent::Connect => self.connect(),
            SessionEvent::Transport(event) => self.handle_transport(event),
            SessionEvent::Submit { source } => self.submit(source),
            SessionEvent::Unload => self.teardown(),
        }
    }

    fn connect(&mut self) -> Vec<SessionAction> {
        match self.connection.begin_open() {
            Ok(()) => {
                let url = self.connection.url().clone();
                vec![
                    SessionAction::log(LogLevel::Debug, format!("connecting to {url}")),
                    SessionAction::Connect { url },
                ]
            },
            Err(e) => vec![SessionAction::log(LogLevel::Warn, format!("connect refused: {e}"))],
        }
    }

    fn handle_transport(&mut self, event: TransportEvent) -> Vec<SessionAction> {
        match event {
            TransportEvent::Opened => match self.connection.mark_open() {
                Ok(()) => vec![SessionAction::log(LogLevel::Info, "connection open")],
                Err(e) => vec![SessionAction::log(LogLevel::Warn, format!("unexpected open: {e}"))],
            },
            TransportEvent::Closed => {
                self.connection.mark_closed();
                self.phase = Phase::Idle;
                self.pending_submission = None;
                vec![SessionAction::log(LogLevel::Info, "connection closed")]
            },
            TransportEvent::Message(raw) => match ServerMessage::decode(&raw) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    vec![SessionAction::log(LogLevel::Warn, format!("dropping message: {e}"))]
                },
            },
            TransportEvent::Error(info) => {
                vec![SessionAction::log(LogLevel::Warn, format!("transport error: {info}"))]
            },
        }
    }

    fn handle_message(&mut self, message: ServerMessage) -> Vec<SessionAction> {
        match message {
            ServerMessage::Started => {
                self.phase = Phase::Running;
                self.pending_submission = None;
                vec![SessionAction::log(LogLevel::Debug, "run started")]
            },
            ServerMessage::Stopped => {
                self.phase = Phase::Idle;
                self.pending_submission = None;
                vec![SessionAction::log(LogLevel::Debug, "run stopped")]
            },
            ServerMessage::Output { stream, text } => {
                vec![SessionAction::Render(RenderIntent::AppendLine { stream, text })]
            },
            ServerMessage::Error { diagnostic } => {
                self.phase = Phase::Idle;
                self.pending_submission = None;
                vec![
                    SessionAction::log(LogLevel::Warn, format!("backend error: {diagnostic}")),
                    SessionAction::Render(RenderIntent::stderr(diagnostic)),
                ]
            },
            ServerMessage::Unknown { kind, .. } => {
                vec![SessionAction::log(LogLevel::Warn, format!("unknown message type {kind:?}"))]
            },
        }
    }

    fn submit(&mut self, source: String) -> Vec<SessionAction> {
        if source.is_empty() {
            return vec![SessionAction::log(LogLevel::Debug, "submit ignored: empty source")];
        }

        if !self.connection.can_send() {
            let state = self.connection.state();
            return vec![SessionAction::log(
                LogLevel::Debug,
                format!("submit ignored: connection is {state:?}"),
            )];
        }

        if self.phase == Phase::Running {
            return vec![SessionAction::log(LogLevel::Debug, "submit ignored: run in progress")];
        }

        let bytes = source.len();
        self.pending_submission = Some(source.clone());
        vec![
            SessionAction::Render(RenderIntent::ClearOutput),
            SessionAction::Send(ClientMessage::Run { source }),
            SessionAction::log(LogLevel::Debug, format!("run submitted ({bytes} bytes)")),
        ]
    }

    fn teardown(&mut self) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        if self.connection.can_send() {
            actions.push(SessionAction::Send(ClientMessage::Close));
        }

        self.connection.mark_closed();
        self.pending_submission = None;
        self.torn_down = true;

        actions.push(SessionAction::log(LogLevel::Debug, "session torn down"));
        actions.push(SessionAction::Disconnect);
        actions
    }
}
