//! Render intents and the sink that consumes them.
//!
//! The session never touches a display. It describes updates as
//! [`RenderIntent`] values and the caller hands them to a [`RenderSink`].

use std::convert::Infallible;

use runwire_proto::OutputStream;

/// Description of a single output update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderIntent {
    /// Discard everything shown so far.
    ClearOutput,

    /// Append one chunk, tagged with the stream it came from.
    AppendLine {
        /// Stream the chunk was written to.
        stream: OutputStream,
        /// Chunk text. Rendered literally, never interpreted as markup.
        text: String,
    },
}

impl RenderIntent {
    /// Append intent for a standard output chunk.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self::AppendLine { stream: OutputStream::Stdout, text: text.into() }
    }

    /// Append intent for a standard error chunk.
    pub fn stderr(text: impl Into<String>) -> Self {
        Self::AppendLine { stream: OutputStream::Stderr, text: text.into() }
    }

    /// Dispatch this intent to a sink.
    ///
    /// # Errors
    ///
    /// Whatever the sink reports.
    pub fn apply<S: RenderSink + ?Sized>(self, sink: &mut S) -> Result<(), S::Error> {
        match self {
            Self::ClearOutput => sink.clear_output(),
            Self::AppendLine { stream, text } => sink.append_line(stream, &text),
        }
    }
}

/// Consumer of render intents.
pub trait RenderSink {
    /// Error raised by the underlying display.
    type Error;

    /// Discard all output shown so far.
    fn clear_output(&mut self) -> Result<(), Self::Error>;

    /// Append one chunk on the given stream.
    fn append_line(&mut self, stream: OutputStream, text: &str) -> Result<(), Self::Error>;
}

/// One rendered chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    /// Stream the chunk belongs to.
    pub stream: OutputStream,
    /// Chunk text.
    pub text: String,
}

/// In-memory sink that records what a display would currently show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLog {
    lines: Vec<OutputLine>,
    clears: usize,
}

impl OutputLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines visible since the last clear, oldest first.
    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    /// Concatenated text of the visible lines on one stream.
    pub fn text(&self, stream: OutputStream) -> String {
        self.lines.iter().filter(|line| line.stream == stream).map(|line| line.text.as_str()).collect()
    }

    /// Number of times the output was cleared.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Whether nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl RenderSink for OutputLog {
    type Error = Infallible;

    fn clear_output(&mut self) -> Result<(), Infallible> {
        self.lines.clear();
        self.clears += 1;
        Ok(())
    }

    fn append_line(&mut self, stream: OutputStream, text: &str) -> Result<(), Infallible> {
        self.lines.push(OutputLine { stream, text: text.to_string() });
        Ok(())
    }
}
