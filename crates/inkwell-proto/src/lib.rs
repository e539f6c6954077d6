//! Inkwell wire protocol.
//!
//! The chat channel exchanges one JSON object per WebSocket text message. The
//! client sends [`OutboundFrame`]s carrying the user's request scoped to an
//! article and a brand; the server answers with [`InboundFrame`]s
//! discriminated by their `type` field.
//!
//! # Components
//!
//! - [`OutboundFrame`]: client → server request
//! - [`InboundFrame`]: server → client heartbeat, progress, reply or error
//! - [`CloseCode`]: WebSocket close status, separating deliberate closure from
//!   drops
//! - [`endpoint_url`]: `{base}/ws/{client_id}` endpoint construction

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod close;
pub mod errors;
pub mod frame;

pub use close::CloseCode;
pub use errors::{ProtocolError, Result};
pub use frame::{DEFAULT_PLATFORM, FrameMetadata, InboundFrame, MAX_FRAME_BYTES, OutboundFrame};

/// Build the WebSocket endpoint for one connection attempt.
///
/// A trailing slash on `base` is ignored so `wss://host/` and `wss://host`
/// produce the same URL.
pub fn endpoint_url(base: &str, client_id: &str) -> String {
    format!("{}/ws/{client_id}", base.trim_end_matches('/'))
}
