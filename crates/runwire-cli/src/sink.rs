//! Render sink that writes program output to the terminal.

use std::io::{self, Stderr, Stdout, Write};

use runwire_client::{OutputStream, RenderSink};

/// Rule printed between the output of consecutive runs.
pub const SEPARATOR: &str = "----------------------------------------";

/// Writes stdout chunks to one writer and stderr chunks to another.
///
/// Each chunk is shown as a line and flushed immediately. A terminal cannot
/// erase scrolled output, so clearing prints [`SEPARATOR`] instead, and only
/// when something was written since the last clear.
#[derive(Debug)]
pub struct TerminalSink<O: Write = Stdout, E: Write = Stderr> {
    stdout: O,
    stderr: E,
    has_output: bool,
}

impl TerminalSink {
    /// Sink over the process's standard output and standard error.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalSink<O, E> {
    /// Sink over arbitrary writers.
    pub fn new(stdout: O, stderr: E) -> Self {
        Self { stdout, stderr, has_output: false }
    }

    /// Recover the writers.
    pub fn into_inner(self) -> (O, E) {
        (self.stdout, self.stderr)
    }
}

impl<O: Write, E: Write> RenderSink for TerminalSink<O, E> {
    type Error = io::Error;

    fn clear_output(&mut self) -> io::Result<()> {
        if self.has_output {
            writeln!(self.stdout, "{SEPARATOR}")?;
            self.stdout.flush()?;
            self.has_output = false;
        }
        Ok(())
    }

    fn append_line(&mut self, stream: OutputStream, text: &str) -> io::Result<()> {
        let out: &mut dyn Write = match stream {
            OutputStream::Stdout => &mut self.stdout,
            OutputStream::Stderr => &mut self.stderr,
        };

        out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()?;
        self.has_output = true;
        Ok(())
    }
}
