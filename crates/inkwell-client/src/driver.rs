//! Production driver.
//!
//! [`WsDriver`] implements [`Driver`] on top of tokio. It multiplexes three
//! event sources in one `select!`:
//!
//! - transport events from the current (and any superseded) attempt
//! - host commands (mount, unmount, submitted text, quit) from an mpsc channel
//! - the reconnect deadline handed down by the runtime
//!
//! Rendering publishes the snapshot on a `watch` channel so any number of
//! views can follow the session without blocking it.

use std::time::Duration;

use inkwell_app::{Driver, SessionEvent, SessionSnapshot};
use inkwell_core::ClientId;
use inkwell_proto::CloseCode;
use tokio::sync::{mpsc, watch};

use crate::{
    DriverError, TransportError,
    loopback::{self, LoopbackOptions},
    transport::{self, TransportHandle},
};

/// Capacity of the shared transport event channel.
const EVENT_CAPACITY: usize = 256;

/// Where connection attempts go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Real WebSocket to the configured endpoint.
    WebSocket,
    /// In-process loopback assistant. The endpoint URL is ignored.
    Loopback(LoopbackOptions),
}

/// Driver backed by tokio channels and a WebSocket (or loopback) transport.
#[derive(Debug)]
pub struct WsDriver {
    mode: TransportMode,
    commands: mpsc::Receiver<SessionEvent>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
    transport: Option<TransportHandle>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl WsDriver {
    /// Create a driver reading host commands from `commands`.
    ///
    /// `initial` seeds the snapshot channel until the first render.
    pub fn new(
        mode: TransportMode,
        commands: mpsc::Receiver<SessionEvent>,
        initial: SessionSnapshot,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        let (snapshots, _) = watch::channel(initial);
        Self { mode, commands, events_tx, events_rx, transport: None, snapshots }
    }

    /// Follow rendered snapshots.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Transport mode in use.
    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Attempt the current transport serves, if any.
    pub fn current_attempt(&self) -> Option<&ClientId> {
        self.transport.as_ref().map(TransportHandle::client_id)
    }
}

impl Driver for WsDriver {
    type Error = DriverError;

    async fn poll_event(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<SessionEvent>, Self::Error> {
        let deadline = async {
            match timeout {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            // The driver holds a sender, so this never yields None
            Some(event) = self.events_rx.recv() => Ok(Some(event)),

            command = self.commands.recv() => match command {
                Some(event) => Ok(Some(event)),
                None => Err(DriverError::CommandsClosed),
            },

            () = deadline => Ok(None),
        }
    }

    async fn connect(&mut self, url: &str, client_id: &ClientId) -> Result<(), Self::Error> {
        let events = self.events_tx.clone();
        let handle = match self.mode {
            TransportMode::WebSocket => {
                tracing::info!(%url, %client_id, "connecting");
                transport::connect(url, client_id.clone(), events)
            },
            TransportMode::Loopback(options) => {
                tracing::info!(%client_id, "connecting to loopback assistant");
                loopback::spawn(client_id.clone(), events, options)
            },
        };

        // A superseded attempt finishes its close handshake on its own
        self.transport = Some(handle);
        Ok(())
    }

    async fn send_frame(&mut self, payload: String) -> Result<(), Self::Error> {
        let transport = self.transport.as_ref().ok_or(DriverError::NotConnected)?;
        transport.send_text(payload).await?;
        Ok(())
    }

    async fn close(&mut self, code: CloseCode, reason: &str) -> Result<(), Self::Error> {
        let Some(transport) = self.transport.take() else {
            return Ok(());
        };

        match transport.close(code, reason).await {
            // Socket already gone; nothing left to close
            Ok(()) | Err(TransportError::Closed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn render(&mut self, snapshot: &SessionSnapshot) -> Result<(), Self::Error> {
        self.snapshots.send_replace(snapshot.clone());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use inkwell_app::{Session, SessionConfig};
    use inkwell_core::ConnectionState;

    use super::*;
    use crate::SystemEnv;

    fn loopback_driver() -> (WsDriver, mpsc::Sender<SessionEvent>) {
        let (tx, rx) = mpsc::channel(8);
        let session = Session::new(SessionConfig::new("ws://unused", "a", "b"), SystemEnv::new());
        let mode = TransportMode::Loopback(LoopbackOptions { step_delay: Duration::from_millis(1) });
        (WsDriver::new(mode, rx, session.snapshot()), tx)
    }

    #[tokio::test]
    async fn timeout_elapses_without_events() {
        let (mut driver, _tx) = loopback_driver();
        let event = driver.poll_event(Some(Duration::from_millis(5))).await.unwrap();
        assert_eq!(event, None);
    }

    #[tokio::test]
    async fn commands_are_forwarded() {
        let (mut driver, tx) = loopback_driver();
        tx.send(SessionEvent::Mount).await.unwrap();
        assert_eq!(driver.poll_event(None).await.unwrap(), Some(SessionEvent::Mount));
    }

    #[tokio::test]
    async fn closed_command_channel_is_an_error() {
        let (mut driver, tx) = loopback_driver();
        drop(tx);
        assert!(matches!(driver.poll_event(None).await, Err(DriverError::CommandsClosed)));
    }

    #[tokio::test]
    async fn send_without_transport_fails() {
        let (mut driver, _tx) = loopback_driver();
        assert!(matches!(driver.send_frame("{}".into()).await, Err(DriverError::NotConnected)));
    }

    #[tokio::test]
    async fn close_without_transport_is_ok() {
        let (mut driver, _tx) = loopback_driver();
        driver.close(CloseCode::NORMAL, "bye").await.unwrap();
    }

    #[tokio::test]
    async fn loopback_connect_reports_open() {
        let (mut driver, _tx) = loopback_driver();
        let id = ClientId::from("1-abc");
        driver.connect("ignored", &id).await.unwrap();

        assert_eq!(driver.current_attempt(), Some(&id));
        assert_eq!(driver.poll_event(None).await.unwrap(), Some(SessionEvent::Opened { client_id: id }));
    }

    #[tokio::test]
    async fn render_publishes_snapshot() {
        let (mut driver, _tx) = loopback_driver();
        let mut rx = driver.subscribe();

        let mut snapshot = rx.borrow().clone();
        assert_eq!(snapshot.state, ConnectionState::Idle);
        snapshot.input = "draft".into();
        driver.render(&snapshot).unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().input, "draft");
    }
}
