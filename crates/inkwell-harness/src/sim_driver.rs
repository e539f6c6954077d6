//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the WebSocket driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`inkwell_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! The driver plays a script of [`SimStep`]s. Transport events produced by
//! the simulated backend (opens, replies, closes) are delivered before the
//! next scripted step, so a step always observes a settled session. When the
//! script runs out the driver lets any pending reconnect play out under
//! virtual time and then quits.

use std::{collections::VecDeque, fmt, time::Duration};

use inkwell_app::{Driver, SessionEvent, SessionSnapshot};
use inkwell_core::ClientId;
use inkwell_proto::CloseCode;

use crate::{
    SimEnv, SimServer,
    invariants::{InvariantRegistry, SystemSnapshot},
};

/// Error type for simulation driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimDriverError(pub String);

impl fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// One scripted step.
#[derive(Debug, Clone)]
pub enum SimStep {
    /// Deliver a host event (mount, unmount, submit, ...).
    Host(SessionEvent),
    /// Let virtual time pass.
    Wait(Duration),
    /// Server pushes a raw payload on the live socket.
    Push(String),
    /// Live socket drops with the given close code.
    Drop(CloseCode),
    /// Start (or stop) refusing new connections.
    Refuse(bool),
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] so the same [`inkwell_app::Runtime`] orchestration
/// code runs in production and simulation tests.
#[derive(Debug)]
pub struct SimDriver {
    env: SimEnv,
    server: SimServer,
    script: VecDeque<SimStep>,
    events: VecDeque<SessionEvent>,
    live: Option<ClientId>,
    connects: Vec<(Duration, ClientId)>,
    outgoing: Vec<String>,
    closes: Vec<(CloseCode, String)>,
    renders: usize,
    last_render: Option<SessionSnapshot>,
    invariants: Option<InvariantRegistry>,
}

impl SimDriver {
    /// Create a driver sharing `env`'s virtual clock, backed by an echoing
    /// [`SimServer`].
    pub fn new(env: SimEnv) -> Self {
        Self {
            env,
            server: SimServer::new(),
            script: VecDeque::new(),
            events: VecDeque::new(),
            live: None,
            connects: Vec::new(),
            outgoing: Vec::new(),
            closes: Vec::new(),
            renders: 0,
            last_render: None,
            invariants: None,
        }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Replace the simulated backend.
    #[must_use]
    pub fn with_server(mut self, server: SimServer) -> Self {
        self.server = server;
        self
    }

    /// Append a step to the script.
    pub fn push_step(&mut self, step: SimStep) {
        self.script.push_back(step);
    }

    /// Append several steps to the script.
    pub fn extend_script(&mut self, steps: impl IntoIterator<Item = SimStep>) {
        self.script.extend(steps);
    }

    /// Simulated backend.
    pub fn server(&self) -> &SimServer {
        &self.server
    }

    /// Simulated backend, for scripting replies.
    pub fn server_mut(&mut self) -> &mut SimServer {
        &mut self.server
    }

    /// Connection attempts made so far with the virtual time of each.
    pub fn connects(&self) -> &[(Duration, ClientId)] {
        &self.connects
    }

    /// Frames the session transmitted, in order.
    pub fn outgoing(&self) -> &[String] {
        &self.outgoing
    }

    /// Close requests the session issued.
    pub fn closes(&self) -> &[(CloseCode, String)] {
        &self.closes
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Most recently rendered snapshot.
    pub fn last_render(&self) -> Option<&SessionSnapshot> {
        self.last_render.as_ref()
    }

    fn next_scripted(&mut self, timeout: Option<Duration>) -> Option<Option<SessionEvent>> {
        let step = self.script.pop_front()?;
        let event = match step {
            SimStep::Host(event) => Some(event),
            SimStep::Wait(duration) => {
                // Stop early at the reconnect deadline so it fires on time
                match timeout {
                    Some(deadline) if deadline < duration => {
                        self.env.advance(deadline);
                        self.script.push_front(SimStep::Wait(duration - deadline));
                    },
                    _ => self.env.advance(duration),
                }
                None
            },
            SimStep::Push(payload) => match &self.live {
                Some(client_id) => Some(SessionEvent::Frame { client_id: client_id.clone(), payload }),
                None => {
                    tracing::debug!("push with no live socket dropped");
                    None
                },
            },
            SimStep::Drop(code) => match self.live.take() {
                Some(client_id) => Some(SessionEvent::Closed {
                    client_id,
                    code,
                    reason: "simulated drop".into(),
                }),
                None => None,
            },
            SimStep::Refuse(refuse) => {
                self.server.set_accepting(!refuse);
                None
            },
        };
        Some(event)
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<SessionEvent>, Self::Error> {
        if let Some(event) = self.events.pop_front() {
            return Ok(Some(event));
        }

        if let Some(event) = self.next_scripted(timeout) {
            return Ok(event);
        }

        // Script exhausted: let pending reconnects run, then stop
        match timeout {
            Some(delay) => {
                self.env.advance(delay);
                Ok(None)
            },
            None => Ok(Some(SessionEvent::Quit)),
        }
    }

    async fn connect(&mut self, _url: &str, client_id: &ClientId) -> Result<(), Self::Error> {
        self.connects.push((self.env.elapsed(), client_id.clone()));

        if self.server.is_accepting() {
            self.live = Some(client_id.clone());
            self.events.push_back(SessionEvent::Opened { client_id: client_id.clone() });
        } else {
            self.live = None;
            self.events.push_back(SessionEvent::TransportError {
                client_id: client_id.clone(),
                message: "connection refused".into(),
            });
            self.events.push_back(SessionEvent::Closed {
                client_id: client_id.clone(),
                code: CloseCode::ABNORMAL,
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }

    async fn send_frame(&mut self, payload: String) -> Result<(), Self::Error> {
        let Some(client_id) = self.live.clone() else {
            return Err(SimDriverError("no open socket".into()));
        };

        for reply in self.server.respond(&payload) {
            self.events.push_back(SessionEvent::Frame { client_id: client_id.clone(), payload: reply });
        }
        self.outgoing.push(payload);
        Ok(())
    }

    async fn close(&mut self, code: CloseCode, reason: &str) -> Result<(), Self::Error> {
        self.closes.push((code, reason.to_string()));

        // The close handshake completes after the session forgot the attempt
        if let Some(client_id) = self.live.take() {
            self.events.push_back(SessionEvent::Closed {
                client_id,
                code,
                reason: reason.to_string(),
            });
        }
        Ok(())
    }

    fn render(&mut self, snapshot: &SessionSnapshot) -> Result<(), Self::Error> {
        self.renders += 1;

        if let Some(registry) = &self.invariants {
            let state = match self.last_render.take() {
                Some(previous) => SystemSnapshot::step(previous, snapshot.clone()),
                None => SystemSnapshot::initial(snapshot.clone()),
            };
            registry.assert_all(&state, &format!("at render {}", self.renders));
        }

        self.last_render = Some(snapshot.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.live = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_opens_when_accepting() {
        let mut driver = SimDriver::new(SimEnv::default());
        let id = ClientId::from("1-abc");
        driver.connect("ws://sim/ws/1-abc", &id).await.unwrap();

        let event = driver.poll_event(None).await.unwrap();
        assert_eq!(event, Some(SessionEvent::Opened { client_id: id }));
    }

    #[tokio::test]
    async fn refused_connect_reports_error_then_close() {
        let mut driver = SimDriver::new(SimEnv::default());
        driver.server_mut().set_accepting(false);
        let id = ClientId::from("1-abc");
        driver.connect("ws://sim/ws/1-abc", &id).await.unwrap();

        assert!(matches!(
            driver.poll_event(None).await.unwrap(),
            Some(SessionEvent::TransportError { .. })
        ));
        assert!(matches!(
            driver.poll_event(None).await.unwrap(),
            Some(SessionEvent::Closed { code: CloseCode::ABNORMAL, .. })
        ));
    }

    #[tokio::test]
    async fn send_without_socket_fails() {
        let mut driver = SimDriver::new(SimEnv::default());
        assert!(driver.send_frame("{}".into()).await.is_err());
    }

    #[tokio::test]
    async fn wait_stops_at_deadline() {
        let env = SimEnv::default();
        let mut driver = SimDriver::new(env.clone());
        driver.push_step(SimStep::Wait(Duration::from_secs(5)));

        let event = driver.poll_event(Some(Duration::from_secs(2))).await.unwrap();
        assert_eq!(event, None);
        assert_eq!(env.elapsed(), Duration::from_secs(2));

        let event = driver.poll_event(None).await.unwrap();
        assert_eq!(event, None);
        assert_eq!(env.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn exhausted_script_quits() {
        let mut driver = SimDriver::new(SimEnv::default());
        assert_eq!(driver.poll_event(None).await.unwrap(), Some(SessionEvent::Quit));
    }
}
