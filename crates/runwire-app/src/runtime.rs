//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`RunSession`]: protocol state machine
//! - [`Driver`]: Platform-specific I/O
//!
//! It is the single control point: events are handled one at a time in the
//! order the driver yields them, and actions execute in the order the session
//! returned them.
//!
//! # Draining
//!
//! With [`RuntimeConfig::exit_after_run`] the runtime does not tear down the
//! moment a run finishes. Output can still be in flight behind `stopped`, so
//! it keeps dispatching events until the driver stays quiet for
//! [`RuntimeConfig::drain_grace`], runs dry, or the connection closes.

use std::time::Duration;

use runwire_client::{LogLevel, Phase, RunSession, SessionAction, SessionEvent};

use crate::{Driver, DriverEvent};

/// Runtime behaviour switches.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Tear down once a submitted run has finished and no late output
    /// arrived for [`drain_grace`](Self::drain_grace).
    pub exit_after_run: bool,
    /// Tear down once the transport reports the connection closed.
    pub exit_on_close: bool,
    /// Quiet period after a finished run before tearing down.
    pub drain_grace: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { exit_after_run: false, exit_on_close: false, drain_grace: Duration::from_millis(250) }
    }
}

/// Generic runtime that orchestrates a [`RunSession`] over a [`Driver`].
///
/// Dropping a runtime whose session was not torn down feeds an unload through
/// the session first, so the best-effort `close` is attempted on every exit
/// path, including errors.
pub struct Runtime<D: Driver> {
    driver: D,
    session: RunSession,
    config: RuntimeConfig,
    /// A submit was accepted since the runtime started
    saw_run: bool,
    /// The run finished; waiting for late output before tearing down
    draining: bool,
}

impl<D: Driver> Runtime<D> {
    /// Create a new runtime with the given driver and session.
    pub fn new(driver: D, session: RunSession, config: RuntimeConfig) -> Self {
        Self { driver, session, config, saw_run: false, draining: false }
    }

    /// Run the main event loop until the session is torn down.
    ///
    /// 1. Issues the connect
    /// 2. Polls events from the driver, treating end of input as unload
    /// 3. Executes the session's actions through the driver
    ///
    /// While draining, polling is bounded by [`RuntimeConfig::drain_grace`],
    /// which needs a tokio runtime with the time driver enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.start()?;

        while !self.is_stopped() {
            let polled = if self.draining {
                let grace = self.config.drain_grace;
                match tokio::time::timeout(grace, self.driver.poll_event()).await {
                    Ok(polled) => polled?,
                    Err(_) => {
                        tracing::debug!(?grace, "no late output, tearing down");
                        self.dispatch(SessionEvent::Unload)?;
                        continue;
                    },
                }
            } else {
                self.driver.poll_event().await?
            };

            let event = match polled {
                Some(event) => SessionEvent::from(event),
                None => {
                    tracing::debug!("driver exhausted, tearing down");
                    SessionEvent::Unload
                },
            };
            self.dispatch(event)?;
        }

        Ok(())
    }

    /// Issue the connect for the session's socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot issue the connect.
    pub fn start(&mut self) -> Result<(), D::Error> {
        self.dispatch(SessionEvent::Connect)
    }

    /// Process one driver event.
    ///
    /// Returns `true` once the session has been torn down.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub fn step(&mut self, event: DriverEvent) -> Result<bool, D::Error> {
        self.dispatch(event.into())?;
        Ok(self.is_stopped())
    }

    /// Whether the session has been torn down.
    pub fn is_stopped(&self) -> bool {
        self.session.is_torn_down()
    }

    /// Whether the run finished and the runtime only waits for late output.
    pub fn is_draining(&self) -> bool {
        self.draining && !self.is_stopped()
    }

    /// The run session
    pub fn session(&self) -> &RunSession {
        &self.session
    }

    /// The driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The driver, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn dispatch(&mut self, event: SessionEvent) -> Result<(), D::Error> {
        let actions = self.session.handle(event);
        self.execute(actions)?;

        let busy =
            self.session.phase() == Phase::Running || self.session.pending_submission().is_some();
        if busy {
            self.saw_run = true;
        }
        self.draining = self.config.exit_after_run && self.saw_run && !busy;

        if !self.session.is_torn_down()
            && self.config.exit_on_close
            && self.session.connection().is_retired()
        {
            let actions = self.session.handle(SessionEvent::Unload);
            self.execute(actions)?;
        }
        Ok(())
    }

    /// Execute actions in order. Every action runs even if an earlier one
    /// failed; the first error is returned.
    fn execute(&mut self, actions: Vec<SessionAction>) -> Result<(), D::Error> {
        let mut first_error = None;
        for action in actions {
            if let Err(e) = self.execute_one(action) {
                tracing::warn!(error = %e, "action failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn execute_one(&mut self, action: SessionAction) -> Result<(), D::Error> {
        match action {
            SessionAction::Connect { url } => self.driver.connect(&url),
            SessionAction::Send(message) => self.driver.send(message),
            SessionAction::Render(intent) => self.driver.render(intent),
            SessionAction::Log { level, message } => {
                match level {
                    LogLevel::Debug => tracing::debug!("{}", message),
                    LogLevel::Info => tracing::info!("{}", message),
                    LogLevel::Warn => tracing::warn!("{}", message),
                    LogLevel::Error => tracing::error!("{}", message),
                }
                Ok(())
            },
            SessionAction::Disconnect => {
                self.driver.stop();
                Ok(())
            },
        }
    }
}

impl<D: Driver> Drop for Runtime<D> {
    fn drop(&mut self) {
        if self.session.is_torn_down() {
            return;
        }

        tracing::debug!("runtime dropped before teardown, unloading");
        let actions = self.session.handle(SessionEvent::Unload);
        if let Err(e) = self.execute(actions) {
            tracing::warn!(error = %e, "teardown failed");
        }
    }
}
