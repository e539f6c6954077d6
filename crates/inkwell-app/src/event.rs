//! Session input events.
//!
//! This module defines [`SessionEvent`], the full set of inputs that drive the
//! [`crate::Session`] state machine.
//!
//! Events originate from two sources:
//! - The hosting view: mount, unmount, submitted text, quit, and ticks.
//! - The transport, tagged with the client id of the attempt that produced
//!   them so events from superseded sockets can be told apart.

use inkwell_core::ClientId;
use inkwell_proto::CloseCode;

/// Events processed by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Hosting view became visible. Connects.
    Mount,

    /// Hosting view was hidden or destroyed. Disconnects.
    Unmount,

    /// Replace the input buffer.
    Input(String),

    /// User submitted text.
    Submit {
        /// Raw text as typed.
        text: String,
    },

    /// Host is shutting down.
    Quit,

    /// Periodic tick. Fires due reconnects.
    Tick,

    /// Socket opened.
    Opened {
        /// Attempt that opened.
        client_id: ClientId,
    },

    /// One text frame received.
    Frame {
        /// Attempt that received it.
        client_id: ClientId,
        /// Raw payload.
        payload: String,
    },

    /// Transport reported an error. A close event follows.
    TransportError {
        /// Attempt that failed.
        client_id: ClientId,
        /// Error description.
        message: String,
    },

    /// Socket closed.
    Closed {
        /// Attempt that closed.
        client_id: ClientId,
        /// Close status.
        code: CloseCode,
        /// Close reason.
        reason: String,
    },

    /// Transmitting an outbound frame failed.
    SendFailed {
        /// Error description.
        reason: String,
    },
}

impl SessionEvent {
    /// Attempt that produced this event. `None` for host events.
    pub fn client_id(&self) -> Option<&ClientId> {
        match self {
            Self::Opened { client_id }
            | Self::Frame { client_id, .. }
            | Self::TransportError { client_id, .. }
            | Self::Closed { client_id, .. } => Some(client_id),
            Self::Mount
            | Self::Unmount
            | Self::Input(_)
            | Self::Submit { .. }
            | Self::Quit
            | Self::Tick
            | Self::SendFailed { .. } => None,
        }
    }
}
