//! Error types for the production transport and driver.

use thiserror::Error;

/// WebSocket transport errors.
///
/// Reported to the session as the message of a
/// [`inkwell_app::SessionEvent::TransportError`]; never returned to the host.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Reading or writing the socket failed.
    #[error("stream error: {0}")]
    Stream(String),

    /// Transport task has already stopped.
    #[error("transport closed")]
    Closed,
}

/// Errors returned by [`crate::WsDriver`].
#[derive(Debug, Error)]
pub enum DriverError {
    /// No socket is open.
    #[error("not connected")]
    NotConnected,

    /// Transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Host dropped its command sender without quitting.
    #[error("host command channel closed")]
    CommandsClosed,
}

/// Invalid client configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// WebSocket base URL is unusable.
    #[error("invalid WebSocket base {base:?}: {reason}")]
    InvalidBase {
        /// Value supplied.
        base: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Required setting is empty.
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}
