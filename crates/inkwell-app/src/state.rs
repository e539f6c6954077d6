//! Observable session state types.
//!
//! This module defines the data structures that represent what the hosting
//! view renders: the [`Message`] transcript, transient [`ProcessingStatus`]
//! notes, and the [`SessionSnapshot`] view model combining them with the
//! connectivity and loading flags.

use inkwell_core::ConnectionState;
use inkwell_proto::FrameMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the user.
    User,
    /// Produced by the assistant, or synthesized locally for failures.
    Assistant,
}

/// Optional metadata attached to a transcript entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Platform the reply was written for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Entry reports a failure rather than a reply.
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
    /// Any other key/value data the server attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde skip_serializing_if signature")]
fn is_false(value: &bool) -> bool {
    !*value
}

impl MessageMetadata {
    /// Metadata marking an entry as an error.
    pub fn error() -> Self {
        Self { error: true, ..Self::default() }
    }
}

impl From<FrameMetadata> for MessageMetadata {
    fn from(metadata: FrameMetadata) -> Self {
        Self { platform: metadata.platform, error: false, extra: metadata.extra }
    }
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Optional metadata. `None` for plain user and assistant entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// Entry typed by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), metadata: None }
    }

    /// Assistant reply with optional metadata.
    pub fn assistant(content: impl Into<String>, metadata: Option<MessageMetadata>) -> Self {
        Self { role: Role::Assistant, content: content.into(), metadata }
    }

    /// Assistant-role failure notice.
    pub fn error(content: impl Into<String>) -> Self {
        Self::assistant(content, Some(MessageMetadata::error()))
    }

    /// Whether this entry reports a failure.
    pub fn is_error(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.error)
    }
}

/// Progress note for the in-flight request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    /// Human-readable progress text.
    pub text: String,
    /// Unix millis when received. Unique and strictly increasing within a
    /// session.
    pub timestamp: u64,
}

/// Everything the hosting view needs to render one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Ordered transcript.
    pub messages: Vec<Message>,
    /// Progress notes for the in-flight request.
    pub statuses: Vec<ProcessingStatus>,
    /// Connection lifecycle state.
    pub state: ConnectionState,
    /// Whether a request is in flight.
    pub loading: bool,
    /// Automatic reconnects since the last successful open.
    pub retries: u32,
    /// Retry ceiling.
    pub max_retries: u32,
    /// Whether an automatic reconnect is scheduled.
    pub reconnect_pending: bool,
    /// Current input buffer.
    pub input: String,
}

impl SessionSnapshot {
    /// Frames can be sent.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Closed with nothing scheduled and the retry budget spent. Requires the
    /// host to mount again.
    pub fn is_exhausted(&self) -> bool {
        self.state == ConnectionState::Closed
            && !self.reconnect_pending
            && self.retries >= self.max_retries
    }

    /// Short connectivity label for a status bar.
    pub fn connectivity_label(&self) -> &'static str {
        match self.state {
            ConnectionState::Open => "Connected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Closed if self.reconnect_pending => "Reconnecting",
            ConnectionState::Idle | ConnectionState::Closed => "Disconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_omits_metadata() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn error_metadata_serializes_flag_only() {
        let json = serde_json::to_string(&Message::error("boom")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"boom","metadata":{"error":true}}"#);
    }

    #[test]
    fn frame_metadata_keeps_extra_fields() {
        let mut frame = FrameMetadata::with_platform("LinkedIn");
        frame.extra.insert("sources".into(), Value::from(3));

        let metadata = MessageMetadata::from(frame);
        assert_eq!(metadata.platform.as_deref(), Some("LinkedIn"));
        assert!(!metadata.error);
        assert_eq!(metadata.extra.get("sources"), Some(&Value::from(3)));
    }

    #[test]
    fn is_error_reads_metadata() {
        assert!(Message::error("x").is_error());
        assert!(!Message::assistant("x", None).is_error());
        assert!(!Message::assistant("x", Some(MessageMetadata::default())).is_error());
    }
}
