//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the session runtime from specific I/O
//! implementations. Each host implements the trait to provide its own
//! transport and rendering, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Duration};

use inkwell_core::ClientId;
use inkwell_proto::CloseCode;

use crate::{SessionEvent, SessionSnapshot};

/// Abstracts I/O operations for the session runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in production and simulation.
///
/// # Implementations
///
/// - **WebSocket**: tokio-tungstenite transport, stdin commands, watch channel
///   rendering
/// - **Loopback**: in-process assistant speaking the same wire contract
/// - **Simulation**: scripted events under virtual time
///
/// # Transport events
///
/// Once [`connect`](Driver::connect) returns, the driver reports the attempt's
/// outcome through [`poll_event`](Driver::poll_event) as
/// [`SessionEvent::Opened`], [`SessionEvent::Frame`],
/// [`SessionEvent::TransportError`] and [`SessionEvent::Closed`], each tagged
/// with the attempt's client id.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next event.
    ///
    /// Returns `None` if `timeout` elapsed first. A `None` timeout waits
    /// indefinitely.
    fn poll_event(
        &mut self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Option<SessionEvent>, Self::Error>> + Send;

    /// Start a connection attempt.
    ///
    /// Any socket from a previous attempt is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt cannot even be started. Failures of a
    /// started attempt are reported as events instead.
    fn connect(
        &mut self,
        url: &str,
        client_id: &ClientId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Transmit one text frame on the open socket.
    ///
    /// # Errors
    ///
    /// Returns an error if no socket is open or the write fails.
    fn send_frame(&mut self, payload: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the current socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the close frame cannot be written.
    fn close(
        &mut self,
        code: CloseCode,
        reason: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Render the session state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, snapshot: &SessionSnapshot) -> Result<(), Self::Error>;

    /// Stop the driver and clean up resources.
    fn stop(&mut self);
}
