//! Inkwell core
//!
//! Sans-IO building blocks for a chat session's real-time channel: the
//! connection lifecycle state machine, the reconnect policy it consults, and
//! the environment abstraction that supplies time and randomness.
//!
//! # Architecture
//!
//! Methods take their inputs (events, time, an [`Environment`]) as parameters
//! and return actions for a driver to execute. Nothing here performs I/O, so
//! the same logic runs under real time in production and virtual time in
//! simulation tests.
//!
//! # Components
//!
//! - [`Connection`]: Idle → Connecting → Open → Closed, with backoff
//! - [`RetryPolicy`]: attempt ceiling and exponential backoff bounds
//! - [`ClientId`]: per-attempt identifier used in the endpoint path
//! - [`Environment`]: time and randomness

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod client_id;
pub mod connection;
pub mod env;
pub mod error;
pub mod retry;

pub use client_id::ClientId;
pub use connection::{
    CloseOutcome, Connection, ConnectionAction, ConnectionState, PendingReconnect,
};
pub use env::Environment;
pub use error::ConnectionError;
pub use retry::RetryPolicy;
