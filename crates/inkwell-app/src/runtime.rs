//! Generic runtime for session orchestration.
//!
//! The Runtime drives the session event loop, coordinating between:
//! - [`Session`]: chat state machine
//! - [`Driver`]: Platform-specific I/O

use inkwell_core::Environment;
use inkwell_proto::CloseCode;

use crate::{Driver, Session, SessionAction, SessionEvent};

/// Generic runtime that orchestrates Session and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment for time and randomness
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    session: Session<E>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a new runtime around an unmounted session.
    pub fn new(driver: D, session: Session<E>) -> Self {
        Self { driver, session }
    }

    /// Run the main event loop until the session quits.
    ///
    /// This is the core orchestration loop that:
    /// 1. Mounts the session (first connection attempt)
    /// 2. Waits for the next host or transport event, bounded by the pending
    ///    reconnect deadline
    /// 3. Feeds the event (or a tick on timeout) to the session
    /// 4. Executes the resulting actions through the driver
    ///
    /// Session-level failures never end the loop; they are reported back to
    /// the session as events.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll or render.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.session.snapshot())?;

        let actions = self.session.connect();
        if self.process_actions(actions).await? {
            self.driver.stop();
            return Ok(());
        }

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the session should quit.
    async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        let timeout = self.session.reconnect_delay();
        let event = self.driver.poll_event(timeout).await?.unwrap_or(SessionEvent::Tick);

        let actions = self.session.handle(event);
        self.process_actions(actions).await
    }

    /// Execute actions returned by the Session.
    ///
    /// Driver failures on transport actions become session events, which may
    /// produce further actions.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(
        &mut self,
        initial_actions: Vec<SessionAction>,
    ) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    SessionAction::Render => self.driver.render(&self.session.snapshot())?,
                    SessionAction::Quit => return Ok(true),
                    SessionAction::Connect { url, client_id } => {
                        if let Err(e) = self.driver.connect(&url, &client_id).await {
                            tracing::warn!(%url, error = %e, "failed to start connection");
                            pending_actions.extend(self.session.handle(SessionEvent::Closed {
                                client_id,
                                code: CloseCode::ABNORMAL,
                                reason: e.to_string(),
                            }));
                        }
                    },
                    SessionAction::SendFrame { payload } => {
                        if let Err(e) = self.driver.send_frame(payload).await {
                            pending_actions.extend(
                                self.session.handle(SessionEvent::SendFailed { reason: e.to_string() }),
                            );
                        }
                    },
                    SessionAction::Close { code, reason } => {
                        if let Err(e) = self.driver.close(code, &reason).await {
                            tracing::warn!(error = %e, "failed to close connection");
                        }
                    },
                }
            }
        }
        Ok(false)
    }

    /// Get a reference to the Session
    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    /// Get a mutable reference to the Session
    pub fn session_mut(&mut self) -> &mut Session<E> {
        &mut self.session
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Consume the runtime, returning the session and driver.
    pub fn into_parts(self) -> (Session<E>, D) {
        (self.session, self.driver)
    }
}
