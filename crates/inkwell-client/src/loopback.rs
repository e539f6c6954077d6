//! In-process loopback assistant.
//!
//! Stands in for the chat backend without a network. Requests and replies
//! flow through mpsc channels and the same [`TransportHandle`] the WebSocket
//! transport returns, so the driver cannot tell the two apart.
//!
//! The assistant answers each request with a short run of status frames and
//! then a canned reply tagged with the requested platform. A request that is
//! not a valid frame is answered with an error frame.

use std::time::Duration;

use inkwell_app::SessionEvent;
use inkwell_core::ClientId;
use inkwell_proto::{CloseCode, FrameMetadata, InboundFrame, OutboundFrame};
use tokio::sync::mpsc;

use crate::transport::{Outgoing, TransportHandle};

/// Progress notes sent before every reply.
pub const LOOPBACK_STATUSES: [&str; 3] = [
    "Reading and analyzing the article content...",
    "Applying brand guidelines...",
    "Drafting a response...",
];

/// Loopback tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopbackOptions {
    /// Pause before each status frame and before the reply.
    pub step_delay: Duration,
}

impl Default for LoopbackOptions {
    fn default() -> Self {
        Self { step_delay: Duration::from_millis(400) }
    }
}

/// Spawn a loopback assistant for one connection attempt.
///
/// The attempt opens immediately. The task runs until the driver closes the
/// attempt, drops the handle, or stops it.
pub fn spawn(
    client_id: ClientId,
    events: mpsc::Sender<SessionEvent>,
    options: LoopbackOptions,
) -> TransportHandle {
    let (to_server_tx, mut to_server_rx) = mpsc::channel::<Outgoing>(32);
    let id = client_id.clone();

    let handle = tokio::spawn(async move {
        if events.send(SessionEvent::Opened { client_id: id.clone() }).await.is_err() {
            return;
        }

        let (code, reason) = loop {
            match to_server_rx.recv().await {
                Some(Outgoing::Text(request)) => {
                    for frame in respond(&request) {
                        tokio::time::sleep(options.step_delay).await;

                        let payload = match frame.encode() {
                            Ok(payload) => payload,
                            Err(e) => {
                                tracing::warn!(error = %e, "loopback failed to encode frame");
                                continue;
                            },
                        };
                        let event = SessionEvent::Frame { client_id: id.clone(), payload };
                        if events.send(event).await.is_err() {
                            return;
                        }
                    }
                },
                Some(Outgoing::Close { code, reason }) => break (code, reason),
                None => break (CloseCode::NORMAL, String::new()),
            }
        };

        tracing::debug!(client_id = %id, %code, "loopback closed");
        let _ = events.send(SessionEvent::Closed { client_id: id, code, reason }).await;
    });

    TransportHandle::new(client_id, to_server_tx, handle.abort_handle())
}

/// Frames the assistant answers `request` with, in order.
pub fn respond(request: &str) -> Vec<InboundFrame> {
    let request = match OutboundFrame::decode(request) {
        Ok(request) => request,
        Err(e) => return vec![InboundFrame::Error { error: format!("invalid request: {e}") }],
    };

    let mut frames: Vec<InboundFrame> = LOOPBACK_STATUSES
        .iter()
        .map(|status| InboundFrame::Status { message: (*status).to_string() })
        .collect();

    frames.push(InboundFrame::Message {
        content: format!(
            "Here is a {} draft for article {} in the voice of {}:\n\n{}",
            request.platform, request.article_id, request.brand_id, request.message
        ),
        metadata: Some(FrameMetadata::with_platform(request.platform)),
    });
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(message: &str) -> String {
        OutboundFrame::new(message, "a-1", "b-1", "LinkedIn").encode().unwrap()
    }

    #[test]
    fn reply_follows_statuses() {
        let frames = respond(&request("Summarize"));

        assert_eq!(frames.len(), LOOPBACK_STATUSES.len() + 1);
        assert!(frames[..3].iter().all(|f| matches!(f, InboundFrame::Status { .. })));
        match frames.last() {
            Some(InboundFrame::Message { content, metadata }) => {
                assert!(content.contains("Summarize"));
                assert_eq!(
                    metadata.as_ref().and_then(|m| m.platform.as_deref()),
                    Some("LinkedIn")
                );
            },
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[test]
    fn malformed_request_gets_error_frame() {
        let frames = respond("not json");
        assert!(matches!(frames.as_slice(), [InboundFrame::Error { .. }]));
    }

    #[tokio::test]
    async fn opens_then_closes_on_request() {
        let (tx, mut rx) = mpsc::channel(16);
        let id = ClientId::from("1-loop");
        let handle =
            spawn(id.clone(), tx, LoopbackOptions { step_delay: Duration::from_millis(1) });

        assert_eq!(rx.recv().await, Some(SessionEvent::Opened { client_id: id.clone() }));

        handle.close(CloseCode::NORMAL, "bye").await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Closed { client_id: id, code: CloseCode::NORMAL, reason: "bye".into() })
        );
    }

    #[tokio::test]
    async fn request_produces_frames_for_same_attempt() {
        let (tx, mut rx) = mpsc::channel(16);
        let id = ClientId::from("1-loop");
        let handle =
            spawn(id.clone(), tx, LoopbackOptions { step_delay: Duration::from_millis(1) });
        rx.recv().await.unwrap();

        handle.send_text(request("hi")).await.unwrap();
        for _ in 0..=LOOPBACK_STATUSES.len() {
            match rx.recv().await {
                Some(SessionEvent::Frame { client_id, .. }) => assert_eq!(client_id, id),
                other => panic!("expected frame, got {other:?}"),
            }
        }
    }
}
