//! Fuzz target for Session event sequences
//!
//! Drives a session with arbitrary interleavings of host commands, transport
//! events (for the current attempt or a stale one), raw frames and virtual
//! time, checking the standard invariants after every step.
//!
//! # Invariants
//!
//! - Transcript is append-only
//! - Automatic reconnects never exceed the retry ceiling
//! - A reconnect is only pending while closed
//! - Status keys strictly increase
//! - NEVER panic on any event order or payload

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use inkwell_app::{Session, SessionAction, SessionConfig, SessionEvent};
use inkwell_core::ClientId;
use inkwell_harness::{InvariantRegistry, SimEnv, SystemSnapshot};
use inkwell_proto::{CloseCode, InboundFrame};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Mount,
    Unmount,
    Submit(String),
    Tick,
    Advance { millis: u16 },
    Open { stale: bool },
    Frame { stale: bool, payload: String },
    Status(String),
    Reply(String),
    TransportError { stale: bool },
    Close { stale: bool, code: u16 },
    SendFailed,
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let env = SimEnv::with_seed(input.seed);
    let mut session = Session::new(SessionConfig::new("ws://fuzz", "a", "b"), env.clone());
    let registry = InvariantRegistry::standard();
    let stale = ClientId::from("0-stale");
    let mut current = stale.clone();

    let mut previous = session.snapshot();
    registry.assert_all(&SystemSnapshot::initial(previous.clone()), "at start");

    for (step, op) in input.ops.into_iter().take(256).enumerate() {
        let pick = |is_stale: bool| if is_stale { stale.clone() } else { current.clone() };

        let event = match op {
            Op::Mount => SessionEvent::Mount,
            Op::Unmount => SessionEvent::Unmount,
            Op::Submit(text) => SessionEvent::Submit { text },
            Op::Tick => SessionEvent::Tick,
            Op::Advance { millis } => {
                env.advance(Duration::from_millis(u64::from(millis)));
                SessionEvent::Tick
            },
            Op::Open { stale } => SessionEvent::Opened { client_id: pick(stale) },
            Op::Frame { stale, payload } => SessionEvent::Frame { client_id: pick(stale), payload },
            Op::Status(message) => SessionEvent::Frame {
                client_id: current.clone(),
                payload: InboundFrame::Status { message }.encode().unwrap_or_default(),
            },
            Op::Reply(content) => SessionEvent::Frame {
                client_id: current.clone(),
                payload: InboundFrame::Message { content, metadata: None }
                    .encode()
                    .unwrap_or_default(),
            },
            Op::TransportError { stale } => {
                SessionEvent::TransportError { client_id: pick(stale), message: "fuzz".into() }
            },
            Op::Close { stale, code } => SessionEvent::Closed {
                client_id: pick(stale),
                code: CloseCode::from(code),
                reason: String::new(),
            },
            Op::SendFailed => SessionEvent::SendFailed { reason: "fuzz".into() },
        };

        for action in session.handle(event) {
            if let SessionAction::Connect { client_id, .. } = action {
                current = client_id;
            }
        }

        let snapshot = session.snapshot();
        registry.assert_all(
            &SystemSnapshot::step(previous, snapshot.clone()),
            &format!("at step {step}"),
        );
        previous = snapshot;
    }
});
