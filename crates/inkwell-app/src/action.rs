//! Session side-effects.
//!
//! This module defines the [`SessionAction`] enum, which represents
//! instructions produced by the [`crate::Session`] state machine for the
//! runtime to execute.

use inkwell_core::ClientId;
use inkwell_proto::CloseCode;

/// Actions produced by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Render the session.
    Render,

    /// Quit the host.
    Quit,

    /// Open a socket.
    Connect {
        /// Full endpoint URL (`{base}/ws/{client_id}`).
        url: String,
        /// Attempt the transport must tag its events with.
        client_id: ClientId,
    },

    /// Transmit one text frame on the open socket.
    SendFrame {
        /// Encoded JSON payload.
        payload: String,
    },

    /// Close the socket.
    Close {
        /// Close status.
        code: CloseCode,
        /// Human-readable reason.
        reason: String,
    },
}
