//! Terminal driver.
//!
//! Implements [`Driver`] over the WebSocket transport. The source text is
//! submitted once, as soon as the connection reports open, and Ctrl-C is
//! reported as unload.

use std::{
    collections::VecDeque,
    future::Future,
    io::{Stderr, Stdout, Write},
};

use runwire_app::{Driver, DriverEvent, UserIntent};
use runwire_client::{
    ClientMessage, RenderIntent, TransportEvent, Url,
    transport::{Subscription, TransportConfig, WsTransport},
};
use tokio::sync::mpsc;

use crate::{CliError, sink::TerminalSink};

/// Driver for the command-line front end.
pub struct TerminalDriver<O: Write = Stdout, E: Write = Stderr> {
    transport: WsTransport,
    events: Subscription,
    interrupts: mpsc::UnboundedReceiver<()>,
    /// Submitted on the first `Opened`
    source: Option<String>,
    /// Events synthesized by the driver, delivered before new input
    queued: VecDeque<DriverEvent>,
    sink: TerminalSink<O, E>,
}

impl TerminalDriver {
    /// Driver writing to the process's standard streams.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(source: String, config: TransportConfig) -> Self {
        Self::with_sink(source, config, TerminalSink::stdio())
    }
}

impl<O: Write + Send, E: Write + Send> TerminalDriver<O, E> {
    /// Driver writing to the given sink.
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_sink(source: String, config: TransportConfig, sink: TerminalSink<O, E>) -> Self {
        let transport = WsTransport::new(config);
        let events = transport.subscribe();

        let (tx, interrupts) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(()).is_err() {
                    break;
                }
            }
        });

        Self { transport, events, interrupts, source: Some(source), queued: VecDeque::new(), sink }
    }

    /// Future that resolves once the connection is closed.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        self.transport.closed()
    }

    async fn next_event(&mut self) -> Option<DriverEvent> {
        if let Some(event) = self.queued.pop_front() {
            return Some(event);
        }

        tokio::select! {
            event = self.events.recv() => {
                let event = event?;
                if event == TransportEvent::Opened
                    && let Some(source) = self.source.take()
                {
                    self.queued.push_back(UserIntent::Submit { source }.into());
                }
                Some(event.into())
            },
            Some(()) = self.interrupts.recv() => {
                tracing::info!("interrupted");
                Some(UserIntent::Unload.into())
            },
        }
    }
}

impl<O: Write + Send, E: Write + Send> Driver for TerminalDriver<O, E> {
    type Error = CliError;

    fn poll_event(&mut self) -> impl Future<Output = Result<Option<DriverEvent>, CliError>> + Send {
        async move { Ok(self.next_event().await) }
    }

    fn connect(&mut self, url: &Url) -> Result<(), CliError> {
        Ok(self.transport.connect(url)?)
    }

    fn send(&mut self, message: ClientMessage) -> Result<(), CliError> {
        self.transport.send(&message);
        Ok(())
    }

    fn render(&mut self, intent: RenderIntent) -> Result<(), CliError> {
        Ok(intent.apply(&mut self.sink)?)
    }

    fn stop(&mut self) {
        self.transport.close();
    }
}
