//! Connection lifecycle state machine.
//!
//! Manages one chat view's real-time connection: attempt identity, open/close
//! transitions, and automatic reconnection with bounded exponential backoff.
//! Uses the action pattern: methods take events and time as input and return
//! actions for the driver to execute.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ connect ┌────────────┐  open   ┌──────┐
//! │ Idle │────────>│ Connecting │────────>│ Open │
//! └──────┘         └────────────┘         └──────┘
//!                     │      ^               │
//!        error/close  │      │ backoff       │ error/close/disconnect
//!                     ↓      │ elapsed       ↓
//!                   ┌─────────────────────────────┐
//!                   │           Closed            │
//!                   └─────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! - At most one reconnect is pending at any time.
//! - A pending reconnect only exists while the state is `Closed`.
//! - `retries <= policy.max_attempts`.
//! - Events tagged with any client id other than the current attempt's are
//!   rejected as stale, so a superseded socket can never drive the policy.

use std::{
    ops::{Add, Sub},
    time::{Duration, Instant},
};

use inkwell_proto::CloseCode;

use crate::{ClientId, RetryPolicy, env::Environment, error::ConnectionError};

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a new socket for this attempt
    Connect {
        /// Identifier for the endpoint path and event tagging
        client_id: ClientId,
    },

    /// Close the socket
    Close {
        /// Close status to send
        code: CloseCode,
        /// Human-readable reason
        reason: String,
    },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected
    Idle,
    /// Socket requested, waiting for open
    Connecting,
    /// Socket open, frames flowing
    Open,
    /// Closed (deliberately, by error, or by the peer)
    Closed,
}

/// A scheduled automatic reconnect.
///
/// Owned by the connection; cancelled by dropping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReconnect<I> {
    /// One-based attempt number this reconnect will be.
    pub attempt: u32,
    /// When the reconnect fires.
    pub deadline: I,
}

/// What the policy decided for a close event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Normal closure; no reconnect.
    Normal,
    /// Reconnect scheduled.
    Reconnecting {
        /// One-based attempt number
        attempt: u32,
        /// Backoff before the attempt
        delay: Duration,
    },
    /// A reconnect was already pending; nothing new scheduled.
    AlreadyScheduled,
    /// Retry ceiling reached; the session stays closed.
    Exhausted,
}

/// Connection state machine
///
/// Pure state machine - no I/O. Generic over `Instant` to support both real
/// time and virtual time for deterministic testing.
#[derive(Debug, Clone)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Sub<Output = Duration> + Add<Duration, Output = I>,
{
    /// Current state
    state: ConnectionState,
    /// Backoff configuration
    policy: RetryPolicy,
    /// Automatic reconnects since the last successful open
    retries: u32,
    /// Attempt whose events are accepted. `None` when no attempt is live.
    current: Option<ClientId>,
    /// Scheduled reconnect, if any
    pending: Option<PendingReconnect<I>>,
    /// Close code of the most recent close event
    last_close: Option<CloseCode>,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Sub<Output = Duration> + Add<Duration, Output = I>,
{
    /// Create a connection in [`ConnectionState::Idle`] state
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: ConnectionState::Idle,
            policy,
            retries: 0,
            current: None,
            pending: None,
            last_close: None,
        }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether frames can be sent.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Automatic reconnects since the last successful open.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Backoff configuration.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Identifier of the live attempt. `None` if no attempt is live.
    #[must_use]
    pub fn client_id(&self) -> Option<&ClientId> {
        self.current.as_ref()
    }

    /// Scheduled reconnect. `None` if nothing is pending.
    #[must_use]
    pub fn pending_reconnect(&self) -> Option<&PendingReconnect<I>> {
        self.pending.as_ref()
    }

    /// Close code of the most recent close event.
    #[must_use]
    pub fn last_close(&self) -> Option<CloseCode> {
        self.last_close
    }

    /// Whether the retry ceiling has been hit and nothing is pending.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.state == ConnectionState::Closed
            && self.pending.is_none()
            && !self.policy.allows(self.retries)
    }

    /// Start a new attempt.
    ///
    /// No-op while `Connecting` or `Open`. Otherwise cancels any pending
    /// reconnect, generates a fresh client id and returns
    /// [`ConnectionAction::Connect`].
    pub fn connect<E>(&mut self, env: &E) -> Vec<ConnectionAction>
    where
        E: Environment<Instant = I>,
    {
        if matches!(self.state, ConnectionState::Connecting | ConnectionState::Open) {
            tracing::debug!(state = ?self.state, "connect ignored, attempt already live");
            return vec![];
        }

        if let Some(pending) = self.pending.take() {
            tracing::debug!(attempt = pending.attempt, "pending reconnect superseded");
        }

        let client_id = ClientId::generate(env);
        tracing::debug!(%client_id, "connecting");

        self.current = Some(client_id.clone());
        self.state = ConnectionState::Connecting;

        vec![ConnectionAction::Connect { client_id }]
    }

    /// Deliberately close the connection (hosting view unmounted).
    ///
    /// Cancels any pending reconnect, forgets the live attempt and resets the
    /// retry budget. Returns a normal-closure [`ConnectionAction::Close`] if
    /// an attempt was live.
    pub fn disconnect(&mut self, reason: &str) -> Vec<ConnectionAction> {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(attempt = pending.attempt, "pending reconnect cancelled");
        }

        self.retries = 0;
        self.state = ConnectionState::Closed;

        match self.current.take() {
            Some(client_id) => {
                tracing::debug!(%client_id, reason, "disconnecting");
                vec![ConnectionAction::Close { code: CloseCode::NORMAL, reason: reason.to_string() }]
            },
            None => vec![],
        }
    }

    /// Socket opened.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::StaleAttempt` if `client_id` is not the live attempt
    /// - `ConnectionError::InvalidState` if not `Connecting`
    pub fn handle_open(&mut self, client_id: &ClientId) -> Result<(), ConnectionError> {
        self.check_current(client_id)?;

        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState { state: self.state, operation: "open" });
        }

        self.state = ConnectionState::Open;
        self.retries = 0;
        Ok(())
    }

    /// Transport reported an error.
    ///
    /// Marks the connection not-connected but schedules nothing; the close
    /// event that follows drives the reconnect policy.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::StaleAttempt` if `client_id` is not the live attempt
    pub fn handle_error(&mut self, client_id: &ClientId) -> Result<(), ConnectionError> {
        self.check_current(client_id)?;

        if matches!(self.state, ConnectionState::Connecting | ConnectionState::Open) {
            self.state = ConnectionState::Closed;
        }
        Ok(())
    }

    /// Socket closed with `code`.
    ///
    /// Abnormal closures schedule a reconnect at `now + backoff` while the
    /// retry budget lasts.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::StaleAttempt` if `client_id` is not the live attempt
    pub fn handle_close(
        &mut self,
        client_id: &ClientId,
        code: CloseCode,
        now: I,
    ) -> Result<CloseOutcome, ConnectionError> {
        self.check_current(client_id)?;

        self.state = ConnectionState::Closed;
        self.last_close = Some(code);

        if code.is_normal() {
            return Ok(CloseOutcome::Normal);
        }

        if self.pending.is_some() {
            return Ok(CloseOutcome::AlreadyScheduled);
        }

        if !self.policy.allows(self.retries) {
            tracing::warn!(retries = self.retries, %code, "reconnect attempts exhausted");
            return Ok(CloseOutcome::Exhausted);
        }

        let delay = self.policy.delay_for(self.retries);
        self.retries += 1;
        self.pending = Some(PendingReconnect { attempt: self.retries, deadline: now + delay });

        tracing::info!(attempt = self.retries, ?delay, %code, "reconnect scheduled");
        Ok(CloseOutcome::Reconnecting { attempt: self.retries, delay })
    }

    /// Time left until the pending reconnect fires. `None` if nothing is
    /// pending.
    #[must_use]
    pub fn reconnect_delay(&self, now: I) -> Option<Duration> {
        self.pending
            .map(|pending| if pending.deadline > now { pending.deadline - now } else { Duration::ZERO })
    }

    /// Fire the pending reconnect if its deadline has passed.
    pub fn tick<E>(&mut self, env: &E) -> Vec<ConnectionAction>
    where
        E: Environment<Instant = I>,
    {
        let now = env.now();
        match self.pending {
            Some(pending) if pending.deadline <= now => {
                self.pending = None;
                tracing::info!(attempt = pending.attempt, "reconnecting");
                self.connect(env)
            },
            _ => vec![],
        }
    }

    fn check_current(&self, client_id: &ClientId) -> Result<(), ConnectionError> {
        if self.current.as_ref() == Some(client_id) {
            Ok(())
        } else {
            Err(ConnectionError::StaleAttempt { client_id: client_id.to_string() })
        }
    }
}
