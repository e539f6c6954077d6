//! JSON frames exchanged over the chat channel.
//!
//! Every WebSocket text message is exactly one frame. Outbound frames are a
//! flat object; inbound frames are internally tagged by `type`.
//!
//! # Invariants
//!
//! - Decoding never panics. Any payload that is not a well-formed frame maps to
//!   [`ProtocolError::Decode`] or [`ProtocolError::FrameTooLarge`].
//! - A well-formed object whose `type` is not one of the known discriminators
//!   decodes to [`InboundFrame::Unknown`] rather than failing, so newer servers
//!   can add frame types without breaking older clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ProtocolError, Result};

/// Platform label sent when the user has not picked a target platform.
pub const DEFAULT_PLATFORM: &str = "General";

/// Upper bound on an inbound payload. Larger payloads are rejected before
/// JSON parsing.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Client → server request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// User's message text (already trimmed).
    pub message: String,
    /// Article the conversation is about.
    pub article_id: String,
    /// Brand whose voice the assistant should use.
    pub brand_id: String,
    /// Target platform label.
    pub platform: String,
}

impl OutboundFrame {
    /// Build a request frame.
    pub fn new(
        message: impl Into<String>,
        article_id: impl Into<String>,
        brand_id: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            article_id: article_id.into(),
            brand_id: brand_id.into(),
            platform: platform.into(),
        }
    }

    /// Serialize to the JSON text sent over the socket.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Parse a request frame (server side and tests).
    pub fn decode(text: &str) -> Result<Self> {
        check_size(text)?;
        serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Optional metadata attached to an assistant reply.
///
/// `platform` is the only field the client interprets; everything else is
/// preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    /// Platform the reply was written for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Any other key/value data the server attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FrameMetadata {
    /// Metadata carrying only a platform label.
    pub fn with_platform(platform: impl Into<String>) -> Self {
        Self { platform: Some(platform.into()), extra: Map::new() }
    }
}

/// Server → client frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Heartbeat. Carries no state.
    Ping,

    /// Progress note for the in-flight request.
    Status {
        /// Human-readable progress text.
        message: String,
    },

    /// Assistant reply. Terminal for the in-flight request.
    Message {
        /// Reply text.
        content: String,
        /// Optional reply metadata.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<FrameMetadata>,
    },

    /// Application error reported by the server. Terminal for the in-flight
    /// request.
    Error {
        /// Error description.
        error: String,
    },

    /// Frame type this client does not understand.
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// Parse one inbound WebSocket text message.
    pub fn decode(text: &str) -> Result<Self> {
        check_size(text)?;
        serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    /// Serialize to JSON text (server side and tests).
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Whether this frame ends the in-flight request.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Message { .. } | Self::Error { .. })
    }

    /// The `type` discriminator as it appears on the wire.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Status { .. } => "status",
            Self::Message { .. } => "message",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }
}

fn check_size(text: &str) -> Result<()> {
    if text.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge { size: text.len(), max: MAX_FRAME_BYTES });
    }
    Ok(())
}
