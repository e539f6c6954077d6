//! Protocol errors.

use thiserror::Error;

/// Result alias for frame encoding and decoding.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload is not a valid frame (bad JSON, missing field, wrong type).
    #[error("malformed frame: {0}")]
    Decode(String),

    /// Frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(String),

    /// Payload exceeds [`crate::MAX_FRAME_BYTES`].
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Size of the rejected payload
        size: usize,
        /// Configured maximum
        max: usize,
    },
}
