//! Chat session state machine.
//!
//! This module defines [`Session`], the manager behind one mounted chat view.
//! It owns the [`Connection`], the transcript, the processing-status list and
//! the loading flag, and is the single entry point through which every
//! transition happens.
//!
//! This is a pure state machine: it consumes [`SessionEvent`] inputs and
//! produces [`SessionAction`] instructions for the runtime to execute. Nothing
//! it does can fail outward; transport and protocol failures become transcript
//! entries or connectivity flags.
//!
//! # Responsibilities
//!
//! - Keeps one live connection per mounted view, reconnecting with backoff.
//! - Gates sends on non-empty input, an open socket and no request in flight.
//! - Dispatches inbound frames in delivery order.

use std::time::Duration;

use inkwell_core::{
    ClientId, CloseOutcome, Connection, ConnectionAction, ConnectionError, ConnectionState,
    Environment,
};
use inkwell_proto::{CloseCode, InboundFrame, OutboundFrame, endpoint_url};

use crate::{
    Message, ProcessingStatus, SendRejected, SessionAction, SessionConfig, SessionEvent,
    SessionSnapshot,
};

/// Notice appended when a send cannot be delivered.
pub const SEND_FAILED_NOTICE: &str = "Failed to send message. Please try again.";

/// Notice appended when an inbound payload cannot be parsed.
pub const MALFORMED_FRAME_NOTICE: &str = "Sorry, I failed to process the response.";

/// Close reason used when the hosting view goes away.
pub const UNMOUNT_REASON: &str = "Chat view closed";

/// Chat session state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug)]
pub struct Session<E: Environment> {
    /// Time and randomness
    env: E,
    /// Endpoint, article, brand, platform and retry policy
    config: SessionConfig,
    /// Connection lifecycle and reconnect policy
    connection: Connection<E::Instant>,
    /// Ordered transcript, append-only
    transcript: Vec<Message>,
    /// Progress notes for the in-flight request
    statuses: Vec<ProcessingStatus>,
    /// A request is in flight
    loading: bool,
    /// Text not yet submitted
    input: String,
    /// Key of the most recent status. `None` before the first status.
    last_status_key: Option<u64>,
}

impl<E: Environment> Session<E> {
    /// Create an unmounted session.
    pub fn new(config: SessionConfig, env: E) -> Self {
        let connection = Connection::new(config.retry);
        Self {
            env,
            config,
            connection,
            transcript: Vec::new(),
            statuses: Vec::new(),
            loading: false,
            input: String::new(),
            last_status_key: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::Mount => self.connect(),
            SessionEvent::Unmount => self.disconnect(),
            SessionEvent::Input(text) => {
                self.input = text;
                vec![SessionAction::Render]
            },
            SessionEvent::Submit { text } => self.send(&text),
            SessionEvent::Quit => {
                let mut actions = self.disconnect();
                actions.push(SessionAction::Quit);
                actions
            },
            SessionEvent::Tick => {
                let actions = self.connection.tick(&self.env);
                self.lift(actions)
            },
            SessionEvent::Opened { client_id } => self.handle_opened(&client_id),
            SessionEvent::Frame { client_id, payload } => {
                if self.is_current(&client_id) {
                    self.dispatch_frame(&payload)
                } else {
                    tracing::debug!(%client_id, "dropping frame from stale attempt");
                    vec![]
                }
            },
            SessionEvent::TransportError { client_id, message } => {
                match self.connection.handle_error(&client_id) {
                    Ok(()) => {
                        tracing::warn!(%client_id, error = %message, "transport error");
                        vec![SessionAction::Render]
                    },
                    Err(e) => self.ignore(&e),
                }
            },
            SessionEvent::Closed { client_id, code, reason } => {
                self.handle_closed(&client_id, code, &reason)
            },
            SessionEvent::SendFailed { reason } => {
                tracing::warn!(%reason, "send failed");
                self.loading = false;
                self.transcript.push(Message::error(SEND_FAILED_NOTICE));
                vec![SessionAction::Render]
            },
        }
    }

    /// Open a connection unless one is already live.
    pub fn connect(&mut self) -> Vec<SessionAction> {
        let actions = self.connection.connect(&self.env);
        self.lift(actions)
    }

    /// Close the connection for good and cancel any pending reconnect.
    ///
    /// The in-flight request, if any, is abandoned.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        let actions = self.connection.disconnect(UNMOUNT_REASON);
        self.loading = false;
        self.statuses.clear();

        let mut actions = self.lift(actions);
        if actions.is_empty() {
            actions.push(SessionAction::Render);
        }
        actions
    }

    /// Check whether `text` could be sent right now.
    ///
    /// Returns the trimmed text on success. Never mutates the session.
    pub fn try_send(&self, text: &str) -> Result<String, SendRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::Empty);
        }
        if self.loading {
            return Err(SendRejected::InFlight);
        }
        if !self.connection.is_open() {
            return Err(SendRejected::NotConnected);
        }
        Ok(text.to_string())
    }

    /// Send `text` as a new request.
    ///
    /// Empty text and sends while a request is in flight are dropped silently.
    /// Sending while disconnected appends a failure notice and starts a
    /// recovery connect.
    pub fn send(&mut self, text: &str) -> Vec<SessionAction> {
        let message = match self.try_send(text) {
            Ok(message) => message,
            Err(SendRejected::NotConnected) => {
                tracing::warn!(state = ?self.connection.state(), "send while not connected");
                self.transcript.push(Message::error(SEND_FAILED_NOTICE));
                let mut actions = vec![SessionAction::Render];
                actions.extend(self.connect());
                return actions;
            },
            Err(reason) => {
                tracing::debug!(%reason, "send rejected");
                return vec![];
            },
        };

        let frame = OutboundFrame::new(
            message.clone(),
            self.config.article_id.clone(),
            self.config.brand_id.clone(),
            self.config.platform.clone(),
        );
        let payload = match frame.encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode request");
                self.transcript.push(Message::error(SEND_FAILED_NOTICE));
                return vec![SessionAction::Render];
            },
        };

        self.statuses.clear();
        self.transcript.push(Message::user(message));
        self.input.clear();
        self.loading = true;

        vec![SessionAction::SendFrame { payload }, SessionAction::Render]
    }

    /// Replace the input buffer.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Send the input buffer.
    pub fn submit(&mut self) -> Vec<SessionAction> {
        let text = self.input.clone();
        self.send(&text)
    }

    /// Time until the pending reconnect fires. `None` if nothing is pending.
    pub fn reconnect_delay(&self) -> Option<Duration> {
        self.connection.reconnect_delay(self.env.now())
    }

    /// View model for rendering.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.transcript.clone(),
            statuses: self.statuses.clone(),
            state: self.connection.state(),
            loading: self.loading,
            retries: self.connection.retries(),
            max_retries: self.connection.policy().max_attempts,
            reconnect_pending: self.connection.pending_reconnect().is_some(),
            input: self.input.clone(),
        }
    }

    /// Ordered transcript.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Progress notes for the in-flight request.
    pub fn statuses(&self) -> &[ProcessingStatus] {
        &self.statuses
    }

    /// Whether a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether frames can be sent.
    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// Connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Underlying connection state machine.
    pub fn connection(&self) -> &Connection<E::Instant> {
        &self.connection
    }

    /// Current input buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Environment the session runs in.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn handle_opened(&mut self, client_id: &ClientId) -> Vec<SessionAction> {
        match self.connection.handle_open(client_id) {
            Ok(()) => {
                tracing::info!(%client_id, "connected");
                vec![SessionAction::Render]
            },
            Err(e) => self.ignore(&e),
        }
    }

    fn handle_closed(
        &mut self,
        client_id: &ClientId,
        code: CloseCode,
        reason: &str,
    ) -> Vec<SessionAction> {
        let now = self.env.now();
        match self.connection.handle_close(client_id, code, now) {
            Ok(outcome) => {
                tracing::info!(%client_id, %code, reason, ?outcome, "connection closed");
                // The reply to an in-flight request can no longer arrive
                self.loading = false;
                if outcome == CloseOutcome::Exhausted {
                    tracing::warn!("giving up, remount to reconnect");
                }
                vec![SessionAction::Render]
            },
            Err(e) => self.ignore(&e),
        }
    }

    fn dispatch_frame(&mut self, payload: &str) -> Vec<SessionAction> {
        let frame = match InboundFrame::decode(payload) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "malformed frame");
                self.finish_request();
                self.transcript.push(Message::error(MALFORMED_FRAME_NOTICE));
                return vec![SessionAction::Render];
            },
        };

        match frame {
            InboundFrame::Ping => vec![],
            InboundFrame::Status { message } => {
                let timestamp = self.next_status_key();
                self.statuses.push(ProcessingStatus { text: message, timestamp });
                vec![SessionAction::Render]
            },
            InboundFrame::Message { content, metadata } => {
                self.finish_request();
                self.transcript.push(Message::assistant(content, metadata.map(Into::into)));
                vec![SessionAction::Render]
            },
            InboundFrame::Error { error } => {
                self.finish_request();
                self.transcript.push(Message::error(format!("Error: {error}")));
                vec![SessionAction::Render]
            },
            InboundFrame::Unknown => {
                tracing::debug!("ignoring frame of unknown type");
                vec![]
            },
        }
    }

    fn finish_request(&mut self) {
        self.statuses.clear();
        self.loading = false;
    }

    fn next_status_key(&mut self) -> u64 {
        let now = self.env.wall_clock_millis();
        let key = match self.last_status_key {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last_status_key = Some(key);
        key
    }

    fn is_current(&self, client_id: &ClientId) -> bool {
        self.connection.client_id() == Some(client_id)
    }

    fn ignore(&self, error: &ConnectionError) -> Vec<SessionAction> {
        if error.is_stale() {
            tracing::debug!(%error, "ignoring event");
        } else {
            tracing::warn!(%error, "ignoring event");
        }
        vec![]
    }

    fn lift(&self, actions: Vec<ConnectionAction>) -> Vec<SessionAction> {
        if actions.is_empty() {
            return vec![];
        }

        let mut lifted: Vec<SessionAction> = actions
            .into_iter()
            .map(|action| match action {
                ConnectionAction::Connect { client_id } => SessionAction::Connect {
                    url: endpoint_url(&self.config.ws_base, client_id.as_str()),
                    client_id,
                },
                ConnectionAction::Close { code, reason } => SessionAction::Close { code, reason },
            })
            .collect();
        lifted.push(SessionAction::Render);
        lifted
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use inkwell_harness::SimEnv;

    use super::*;
    use crate::Role;

    fn config() -> SessionConfig {
        SessionConfig::new("wss://chat.example.com/", "a1", "b1")
    }

    fn connect_id(actions: &[SessionAction]) -> ClientId {
        actions
            .iter()
            .find_map(|action| match action {
                SessionAction::Connect { client_id, .. } => Some(client_id.clone()),
                _ => None,
            })
            .expect("connect action")
    }

    fn open_session() -> (Session<SimEnv>, ClientId) {
        let mut session = Session::new(config(), SimEnv::with_seed(3));
        let id = connect_id(&session.connect());
        session.handle(SessionEvent::Opened { client_id: id.clone() });
        (session, id)
    }

    fn frame(session: &mut Session<SimEnv>, id: &ClientId, payload: &str) -> Vec<SessionAction> {
        session.handle(SessionEvent::Frame { client_id: id.clone(), payload: payload.into() })
    }

    #[test]
    fn connect_targets_endpoint_for_attempt() {
        let mut session = Session::new(config(), SimEnv::default());
        let actions = session.connect();

        let SessionAction::Connect { url, client_id } = &actions[0] else {
            panic!("expected connect, got {actions:?}");
        };
        assert_eq!(url, &format!("wss://chat.example.com/ws/{client_id}"));
        assert_eq!(session.connection_state(), ConnectionState::Connecting);
        assert!(session.connect().is_empty());
    }

    #[test]
    fn send_emits_request_frame() {
        let (mut session, _) = open_session();
        session.set_input("  hi  ");
        let actions = session.submit();

        let SessionAction::SendFrame { payload } = &actions[0] else {
            panic!("expected send, got {actions:?}");
        };
        let request = OutboundFrame::decode(payload).unwrap();
        assert_eq!(request, OutboundFrame::new("hi", "a1", "b1", "General"));

        assert_eq!(session.transcript(), &[Message::user("hi")]);
        assert!(session.is_loading());
        assert_eq!(session.input(), "");
    }

    #[test]
    fn configured_platform_is_sent() {
        let mut session =
            Session::new(config().with_platform("LinkedIn"), SimEnv::default());
        let id = connect_id(&session.connect());
        session.handle(SessionEvent::Opened { client_id: id });

        let actions = session.send("draft a post");
        let SessionAction::SendFrame { payload } = &actions[0] else {
            panic!("expected send");
        };
        assert_eq!(OutboundFrame::decode(payload).unwrap().platform, "LinkedIn");
    }

    #[test]
    fn whitespace_send_is_silent() {
        let (mut session, _) = open_session();
        assert_eq!(session.try_send(" \n\t "), Err(SendRejected::Empty));
        assert!(session.send("   ").is_empty());
        assert!(session.transcript().is_empty());
        assert!(!session.is_loading());
    }

    #[test]
    fn second_send_while_loading_is_dropped() {
        let (mut session, _) = open_session();
        session.send("first");
        assert_eq!(session.try_send("second"), Err(SendRejected::InFlight));
        assert!(session.send("second").is_empty());
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn send_while_disconnected_notifies_and_reconnects() {
        let mut session = Session::new(config(), SimEnv::default());
        assert_eq!(session.try_send("hi"), Err(SendRejected::NotConnected));

        let actions = session.send("hi");
        assert!(actions.iter().any(|a| matches!(a, SessionAction::Connect { .. })));
        assert!(!actions.iter().any(|a| matches!(a, SessionAction::SendFrame { .. })));

        assert_eq!(session.transcript(), &[Message::error(SEND_FAILED_NOTICE)]);
        assert!(!session.is_loading());
    }

    #[test]
    fn status_frames_accumulate_until_reply() {
        let (mut session, id) = open_session();
        session.send("hi");

        frame(&mut session, &id, r#"{"type":"status","message":"Reading the article..."}"#);
        frame(&mut session, &id, r#"{"type":"status","message":"Drafting..."}"#);
        assert_eq!(session.statuses().len(), 2);
        assert!(session.is_loading());

        frame(&mut session, &id, r#"{"type":"message","content":"done","metadata":{"platform":"X"}}"#);
        assert!(session.statuses().is_empty());
        assert!(!session.is_loading());

        let reply = &session.transcript()[1];
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.metadata.as_ref().and_then(|m| m.platform.as_deref()), Some("X"));
    }

    #[test]
    fn status_keys_stay_unique_within_a_millisecond() {
        let (mut session, id) = open_session();
        for _ in 0..3 {
            frame(&mut session, &id, r#"{"type":"status","message":"working"}"#);
        }

        let keys: Vec<_> = session.statuses().iter().map(|s| s.timestamp).collect();
        assert_eq!(keys[1], keys[0] + 1);
        assert_eq!(keys[2], keys[1] + 1);
    }

    #[test]
    fn error_frame_becomes_error_entry() {
        let (mut session, id) = open_session();
        session.send("hi");
        frame(&mut session, &id, r#"{"type":"error","error":"rate limited"}"#);

        let entry = &session.transcript()[1];
        assert_eq!(entry.content, "Error: rate limited");
        assert!(entry.is_error());
        assert!(!session.is_loading());
        assert!(session.is_connected());
    }

    #[test]
    fn malformed_frame_keeps_connection_open() {
        let (mut session, id) = open_session();
        session.send("hi");
        frame(&mut session, &id, r#"{"type":"status","message":"thinking"}"#);
        frame(&mut session, &id, "not json");

        assert_eq!(session.transcript()[1], Message::error(MALFORMED_FRAME_NOTICE));
        assert!(session.statuses().is_empty());
        assert!(!session.is_loading());
        assert_eq!(session.connection_state(), ConnectionState::Open);
    }

    #[test]
    fn ping_and_unknown_frames_change_nothing() {
        let (mut session, id) = open_session();
        let before = session.snapshot();

        assert!(frame(&mut session, &id, r#"{"type":"ping"}"#).is_empty());
        assert!(frame(&mut session, &id, r#"{"type":"typing","who":"bot"}"#).is_empty());
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn frames_from_stale_attempts_are_ignored() {
        let (mut session, old) = open_session();
        session.disconnect();
        let new = connect_id(&session.connect());
        session.handle(SessionEvent::Opened { client_id: new });

        assert!(frame(&mut session, &old, r#"{"type":"message","content":"late"}"#).is_empty());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn abnormal_close_schedules_reconnect_on_tick() {
        let (mut session, id) = open_session();
        session.handle(SessionEvent::Closed {
            client_id: id,
            code: CloseCode::ABNORMAL,
            reason: String::new(),
        });
        assert_eq!(session.reconnect_delay(), Some(Duration::from_secs(1)));
        assert!(session.handle(SessionEvent::Tick).is_empty());

        session.env().advance(Duration::from_secs(1));
        let actions = session.handle(SessionEvent::Tick);
        assert!(matches!(actions[0], SessionAction::Connect { .. }));
        assert_eq!(session.reconnect_delay(), None);
    }

    #[test]
    fn close_mid_request_clears_loading() {
        let (mut session, id) = open_session();
        session.send("hi");
        session.handle(SessionEvent::Closed {
            client_id: id,
            code: CloseCode::GOING_AWAY,
            reason: "server restart".into(),
        });
        assert!(!session.is_loading());
    }

    #[test]
    fn transport_error_waits_for_close() {
        let (mut session, id) = open_session();
        session.handle(SessionEvent::TransportError { client_id: id, message: "reset".into() });

        assert!(!session.is_connected());
        assert_eq!(session.reconnect_delay(), None);
    }

    #[test]
    fn send_failure_appends_notice() {
        let (mut session, _) = open_session();
        session.send("hi");
        session.handle(SessionEvent::SendFailed { reason: "broken pipe".into() });

        assert_eq!(session.transcript(), &[
            Message::user("hi"),
            Message::error(SEND_FAILED_NOTICE)
        ]);
        assert!(!session.is_loading());
    }

    #[test]
    fn unmount_closes_normally_and_cancels_reconnect() {
        let (mut session, id) = open_session();
        session.handle(SessionEvent::Closed {
            client_id: id,
            code: CloseCode::ABNORMAL,
            reason: String::new(),
        });
        assert!(session.reconnect_delay().is_some());

        session.handle(SessionEvent::Unmount);
        assert_eq!(session.reconnect_delay(), None);

        session.env().advance(Duration::from_secs(30));
        assert!(session.handle(SessionEvent::Tick).is_empty());
        assert_eq!(session.connection_state(), ConnectionState::Closed);
    }

    #[test]
    fn unmount_of_open_session_sends_normal_close() {
        let (mut session, _) = open_session();
        let actions = session.handle(SessionEvent::Unmount);
        assert_eq!(actions[0], SessionAction::Close {
            code: CloseCode::NORMAL,
            reason: UNMOUNT_REASON.into()
        });
    }

    #[test]
    fn quit_disconnects_then_quits() {
        let (mut session, _) = open_session();
        let actions = session.handle(SessionEvent::Quit);
        assert!(matches!(actions.first(), Some(SessionAction::Close { .. })));
        assert_eq!(actions.last(), Some(&SessionAction::Quit));
    }
}
