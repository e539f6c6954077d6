//! Scripted chat backend for simulation.
//!
//! [`SimServer`] decodes each request the client sends and answers with the
//! payloads a real backend would push: progress notes followed by a reply.
//! Tests can queue exact payloads (including malformed ones) per request.

use std::collections::VecDeque;

use inkwell_proto::{FrameMetadata, InboundFrame, OutboundFrame};

/// Simulated chat backend.
#[derive(Debug)]
pub struct SimServer {
    accepting: bool,
    scripted: VecDeque<Vec<String>>,
    requests: Vec<OutboundFrame>,
}

impl Default for SimServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimServer {
    /// Server that accepts connections and echoes requests.
    pub fn new() -> Self {
        Self { accepting: true, scripted: VecDeque::new(), requests: Vec::new() }
    }

    /// Whether new connections are accepted.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Refuse (or accept again) new connections.
    pub fn set_accepting(&mut self, accepting: bool) {
        self.accepting = accepting;
    }

    /// Queue the raw payloads to push in response to the next unanswered
    /// request.
    pub fn script_reply<I, S>(&mut self, payloads: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripted.push_back(payloads.into_iter().map(Into::into).collect());
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> &[OutboundFrame] {
        &self.requests
    }

    /// Handle one request payload, returning the payloads to push back.
    pub fn respond(&mut self, payload: &str) -> Vec<String> {
        let request = match OutboundFrame::decode(payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "sim server received malformed request");
                return encode_all(&[InboundFrame::Error { error: "invalid request".into() }]);
            },
        };

        let reply = self.scripted.pop_front().unwrap_or_else(|| echo(&request));
        self.requests.push(request);
        reply
    }
}

fn echo(request: &OutboundFrame) -> Vec<String> {
    encode_all(&[
        InboundFrame::Status { message: "Thinking...".into() },
        InboundFrame::Message {
            content: format!("You said: {}", request.message),
            metadata: Some(FrameMetadata::with_platform(request.platform.clone())),
        },
    ])
}

fn encode_all(frames: &[InboundFrame]) -> Vec<String> {
    frames.iter().filter_map(|frame| frame.encode().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> String {
        OutboundFrame::new(text, "a1", "b1", "General").encode().unwrap()
    }

    #[test]
    fn echo_sends_status_then_reply() {
        let mut server = SimServer::new();
        let replies = server.respond(&request("hi"));

        assert_eq!(replies.len(), 2);
        assert_eq!(InboundFrame::decode(&replies[0]).unwrap().kind(), "status");
        match InboundFrame::decode(&replies[1]).unwrap() {
            InboundFrame::Message { content, metadata } => {
                assert_eq!(content, "You said: hi");
                assert_eq!(metadata.unwrap().platform.as_deref(), Some("General"));
            },
            other => panic!("expected reply, got {other:?}"),
        }
        assert_eq!(server.requests()[0].article_id, "a1");
    }

    #[test]
    fn scripted_replies_take_precedence() {
        let mut server = SimServer::new();
        server.script_reply(["not json"]);

        assert_eq!(server.respond(&request("first")), vec!["not json".to_string()]);
        assert_eq!(server.respond(&request("second")).len(), 2);
        assert_eq!(server.requests().len(), 2);
    }
}
