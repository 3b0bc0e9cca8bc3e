//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use runwire_client::{ClientMessage, RenderIntent, Url};

use crate::DriverEvent;

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal and in simulation.
///
/// # Implementations
///
/// - **Terminal**: WebSocket transport, stdout/stderr output, Ctrl-C unload
/// - **Simulation**: injected events and an in-process backend
///
/// Everything except [`poll_event`](Driver::poll_event) is fire-and-forget:
/// outcomes come back later as events.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next event, in arrival order.
    ///
    /// Returns `None` when no further events will ever arrive, which the
    /// runtime treats as teardown.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<DriverEvent>, Self::Error>> + Send;

    /// Start connecting to the socket URL. Must not wait for the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connect cannot even be issued.
    fn connect(&mut self, url: &Url) -> Result<(), Self::Error>;

    /// Send a message to the backend.
    ///
    /// Best effort: a message that cannot be delivered is dropped.
    fn send(&mut self, message: ClientMessage) -> Result<(), Self::Error>;

    /// Apply a render intent to the output display.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, intent: RenderIntent) -> Result<(), Self::Error>;

    /// Release the connection and clean up resources.
    fn stop(&mut self);
}
