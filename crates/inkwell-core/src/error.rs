//! Error types for the connection state machine.
//!
//! These never reach the hosting view: the session layer logs them and drops
//! the offending event.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors returned by [`crate::Connection`] event handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Event is not valid in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Event belongs to an attempt that has since been superseded or closed
    #[error("stale event from connection attempt {client_id}")]
    StaleAttempt {
        /// Client identifier carried by the event
        client_id: String,
    },
}

impl ConnectionError {
    /// Returns true if the event came from an old attempt.
    ///
    /// Stale events are expected after a reconnect or unmount and are
    /// harmless; invalid transitions indicate a misbehaving transport.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleAttempt { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_classification() {
        assert!(ConnectionError::StaleAttempt { client_id: "1-a".into() }.is_stale());
        assert!(
            !ConnectionError::InvalidState { state: ConnectionState::Idle, operation: "open" }
                .is_stale()
        );
    }
}
