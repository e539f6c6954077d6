//! Send precondition failures.

use thiserror::Error;

/// Why a send was refused.
///
/// Returned by [`crate::Session::try_send`]. No frame is produced and the
/// transcript is untouched for any of these.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejected {
    /// Text was empty after trimming
    #[error("message is empty")]
    Empty,

    /// A previous request has not been answered yet
    #[error("a request is already in flight")]
    InFlight,

    /// Connection is not open
    #[error("not connected")]
    NotConnected,
}
