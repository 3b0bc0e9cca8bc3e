//! In-process model of the execution backend.
//!
//! Answers client requests the way the real service does, without compiling
//! or running anything. Each `run` replays a scripted [`Program`].

use std::collections::VecDeque;

use runwire_proto::{ClientMessage, OutputStream, ProtocolError, ServerMessage};

/// Status line sent on stdout after a program exits cleanly.
pub const STATUS_SUCCESS: &str = "Program ran successful";
/// Status line sent on stderr after a program exits with an error.
pub const STATUS_FAILURE: &str = "Program exited with error";
/// Status line sent on stderr after a program is killed.
pub const STATUS_TIMEOUT: &str = "Program was killed due to timeout";
/// Diagnostic for any request type the backend does not serve.
pub const UNKNOWN_REQUEST: &str = "unknown websocket request";

/// How a scripted program ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Exit status zero.
    Success,
    /// Non-zero exit status.
    Failure,
    /// Killed after exceeding the execution time limit.
    Timeout,
}

/// Reason the backend could not prepare a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupFailure {
    /// Source file could not be created.
    FileCreation,
    /// Source file could not be written.
    FileWrite,
}

impl SetupFailure {
    /// Diagnostic sent to the client.
    pub fn diagnostic(self) -> &'static str {
        match self {
            Self::FileCreation => "file creation failed",
            Self::FileWrite => "file writing failed",
        }
    }
}

/// Scripted behaviour of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Output chunks in emission order.
    pub output: Vec<(OutputStream, String)>,
    /// How the program ends.
    pub outcome: Outcome,
}

impl Program {
    /// Program that prints the given stdout chunks and exits cleanly.
    pub fn printing<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: chunks.into_iter().map(|c| (OutputStream::Stdout, c.into())).collect(),
            outcome: Outcome::Success,
        }
    }

    /// Set the outcome.
    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Append a stderr chunk.
    #[must_use]
    pub fn with_stderr(mut self, text: impl Into<String>) -> Self {
        self.output.push((OutputStream::Stderr, text.into()));
        self
    }
}

impl Default for Program {
    fn default() -> Self {
        Self { output: Vec::new(), outcome: Outcome::Success }
    }
}

/// Simulated execution backend for one connection.
#[derive(Debug, Clone, Default)]
pub struct SimBackend {
    /// Programs for upcoming runs; the last one repeats.
    programs: VecDeque<Program>,
    setup_failure: Option<SetupFailure>,
    /// Sources received in `run` requests.
    runs: Vec<String>,
    closed: bool,
}

impl SimBackend {
    /// Backend whose runs succeed without output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a program for the next run.
    #[must_use]
    pub fn with_program(mut self, program: Program) -> Self {
        self.programs.push_back(program);
        self
    }

    /// Fail every run during setup.
    #[must_use]
    pub fn with_setup_failure(mut self, failure: SetupFailure) -> Self {
        self.setup_failure = Some(failure);
        self
    }

    /// Sources received so far.
    pub fn runs(&self) -> &[String] {
        &self.runs
    }

    /// Whether the client said goodbye.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Answer one text payload from the client.
    ///
    /// Payloads that are not a known request, including malformed JSON, get an
    /// error reply. After `close` the backend stops answering.
    pub fn handle_text(&mut self, raw: &str) -> Vec<ServerMessage> {
        if self.closed {
            return Vec::new();
        }

        match ClientMessage::decode(raw) {
            Ok(request) => self.handle(request),
            Err(ProtocolError::UnknownType { kind }) => {
                tracing::debug!(%kind, "unknown request");
                vec![ServerMessage::error(UNKNOWN_REQUEST)]
            },
            Err(e) => {
                tracing::debug!(error = %e, "malformed request");
                vec![ServerMessage::error(UNKNOWN_REQUEST)]
            },
        }
    }

    /// Answer one decoded request.
    pub fn handle(&mut self, request: ClientMessage) -> Vec<ServerMessage> {
        if self.closed {
            return Vec::new();
        }

        match request {
            ClientMessage::Run { source } => self.run(source),
            ClientMessage::Close => {
                self.closed = true;
                Vec::new()
            },
        }
    }

    fn run(&mut self, source: String) -> Vec<ServerMessage> {
        self.runs.push(source);

        if let Some(failure) = self.setup_failure {
            return vec![ServerMessage::error(failure.diagnostic())];
        }

        let program = if self.programs.len() > 1 {
            self.programs.pop_front().unwrap_or_default()
        } else {
            self.programs.front().cloned().unwrap_or_default()
        };

        let mut replies = vec![ServerMessage::Started];
        replies.extend(
            program.output.into_iter().map(|(stream, text)| ServerMessage::Output { stream, text }),
        );
        replies.push(match program.outcome {
            Outcome::Success => ServerMessage::stdout(STATUS_SUCCESS),
            Outcome::Failure => ServerMessage::stderr(STATUS_FAILURE),
            Outcome::Timeout => ServerMessage::stderr(STATUS_TIMEOUT),
        });
        replies.push(ServerMessage::Stopped);
        replies
    }
}
