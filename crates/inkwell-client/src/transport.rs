//! WebSocket transport for the session.
//!
//! Provides [`TransportHandle`], which owns one socket for one connection
//! attempt. This is a thin layer that just moves text frames - session logic
//! remains in the sans-IO [`inkwell_app::Session`].
//!
//! Every event the task reports is tagged with the attempt's client id. A
//! failed attempt reports [`SessionEvent::TransportError`] followed by
//! [`SessionEvent::Closed`], so the session sees the same sequence whether
//! the socket never opened or dropped later.

use std::{borrow::Cow, time::Duration};

use futures::{SinkExt, StreamExt};
use inkwell_app::SessionEvent;
use inkwell_core::ClientId;
use inkwell_proto::CloseCode;
use tokio::{sync::mpsc, time::Instant};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode as WsCloseCode},
    },
};

use crate::TransportError;

/// Capacity of the outgoing frame channel.
const OUTGOING_CAPACITY: usize = 32;

/// Longest the task waits for the peer to finish a close handshake.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Instruction for a transport task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// Write one text frame.
    Text(String),
    /// Start the close handshake.
    Close {
        /// Close status.
        code: CloseCode,
        /// Human-readable reason.
        reason: String,
    },
}

/// Handle to one connection attempt's transport task.
///
/// Dropping the handle closes the socket with the normal code; [`stop`]
/// aborts it outright.
///
/// [`stop`]: TransportHandle::stop
#[derive(Debug)]
pub struct TransportHandle {
    client_id: ClientId,
    to_server: mpsc::Sender<Outgoing>,
    abort_handle: tokio::task::AbortHandle,
}

impl TransportHandle {
    pub(crate) fn new(
        client_id: ClientId,
        to_server: mpsc::Sender<Outgoing>,
        abort_handle: tokio::task::AbortHandle,
    ) -> Self {
        Self { client_id, to_server, abort_handle }
    }

    /// Attempt this transport serves.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Queue a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the task has stopped.
    pub async fn send_text(&self, payload: String) -> Result<(), TransportError> {
        self.to_server.send(Outgoing::Text(payload)).await.map_err(|_| TransportError::Closed)
    }

    /// Start the close handshake.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the task has stopped.
    pub async fn close(&self, code: CloseCode, reason: &str) -> Result<(), TransportError> {
        self.to_server
            .send(Outgoing::Close { code, reason: reason.to_string() })
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Abort the task without a close handshake.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Open a WebSocket to `url` for `client_id`.
///
/// Returns immediately; the handshake runs on a spawned task which reports
/// [`SessionEvent::Opened`] or a failure through `events`.
pub fn connect(url: &str, client_id: ClientId, events: mpsc::Sender<SessionEvent>) -> TransportHandle {
    let (to_server_tx, to_server_rx) = mpsc::channel(OUTGOING_CAPACITY);
    let handle =
        tokio::spawn(run_connection(url.to_string(), client_id.clone(), to_server_rx, events));

    TransportHandle::new(client_id, to_server_tx, handle.abort_handle())
}

/// Run one attempt, bridging between channels and the socket.
///
/// Once either side starts the close handshake the task keeps reading until
/// the socket ends, so the close reply is flushed, but never for longer than
/// [`CLOSE_TIMEOUT`].
async fn run_connection(
    url: String,
    client_id: ClientId,
    mut outgoing: mpsc::Receiver<Outgoing>,
    events: mpsc::Sender<SessionEvent>,
) {
    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            let error = TransportError::Connect(e.to_string());
            tracing::debug!(%client_id, %url, %error, "handshake failed");
            report_failure(&events, client_id, &error).await;
            return;
        },
    };

    tracing::debug!(%client_id, "socket open");
    if events.send(SessionEvent::Opened { client_id: client_id.clone() }).await.is_err() {
        return;
    }

    let (mut sink, mut stream) = socket.split();

    // Set once the close handshake starts; the first close wins
    let mut outcome: Option<(CloseCode, String)> = None;
    let mut close_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Text(payload))) => {
                    let event = SessionEvent::Frame { client_id: client_id.clone(), payload };
                    if events.send(event).await.is_err() {
                        return;
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    let peer = match frame {
                        Some(frame) => (CloseCode::from(u16::from(frame.code)), frame.reason.into_owned()),
                        None => (CloseCode::NO_STATUS, String::new()),
                    };
                    outcome.get_or_insert(peer);
                    close_deadline.get_or_insert_with(|| Instant::now() + CLOSE_TIMEOUT);
                },
                Some(Ok(Message::Binary(bytes))) => {
                    tracing::debug!(%client_id, len = bytes.len(), "ignoring binary frame");
                },
                // Control frames are answered by tungstenite
                Some(Ok(_)) => {},
                // A reset after the handshake started still ends it
                Some(Err(e)) if outcome.is_some() => {
                    tracing::debug!(%client_id, error = %e, "socket ended during close");
                    break;
                },
                Some(Err(e)) => {
                    let error = TransportError::Stream(e.to_string());
                    report_stream_error(&events, &client_id, &error).await;
                    outcome = Some((CloseCode::ABNORMAL, error.to_string()));
                    break;
                },
                None => break,
            },

            command = outgoing.recv(), if outcome.is_none() => {
                let (code, reason) = match command {
                    Some(Outgoing::Text(payload)) => {
                        if let Err(e) = sink.send(Message::Text(payload)).await {
                            let error = TransportError::Stream(e.to_string());
                            report_stream_error(&events, &client_id, &error).await;
                            outcome = Some((CloseCode::ABNORMAL, error.to_string()));
                            break;
                        }
                        continue;
                    },
                    Some(Outgoing::Close { code, reason }) => (code, reason),
                    // Handle dropped by a superseded attempt
                    None => (CloseCode::NORMAL, String::new()),
                };

                let frame = CloseFrame {
                    code: WsCloseCode::from(code.as_u16()),
                    reason: Cow::Owned(reason.clone()),
                };
                let sent = sink.send(Message::Close(Some(frame))).await;
                outcome = Some((code, reason));
                if sent.is_err() {
                    break;
                }
                close_deadline = Some(Instant::now() + CLOSE_TIMEOUT);
            },

            () = tokio::time::sleep_until(close_deadline.unwrap_or_else(Instant::now)),
                if close_deadline.is_some() =>
            {
                tracing::debug!(%client_id, "peer did not finish close handshake");
                break;
            },
        }
    }

    let (code, reason) =
        outcome.unwrap_or_else(|| (CloseCode::ABNORMAL, "connection closed".to_string()));
    tracing::debug!(%client_id, %code, "socket closed");
    let _ = events.send(SessionEvent::Closed { client_id, code, reason }).await;
}

async fn report_stream_error(
    events: &mpsc::Sender<SessionEvent>,
    client_id: &ClientId,
    error: &TransportError,
) {
    let _ = events
        .send(SessionEvent::TransportError {
            client_id: client_id.clone(),
            message: error.to_string(),
        })
        .await;
}

/// Report a failed attempt the way the session expects: error, then close.
async fn report_failure(
    events: &mpsc::Sender<SessionEvent>,
    client_id: ClientId,
    error: &TransportError,
) {
    report_stream_error(events, &client_id, error).await;
    let _ = events
        .send(SessionEvent::Closed { client_id, code: CloseCode::ABNORMAL, reason: error.to_string() })
        .await;
}
