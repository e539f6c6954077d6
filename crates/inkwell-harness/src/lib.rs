//! Deterministic simulation harness for Inkwell chat sessions.
//!
//! Virtual-time implementations of the Environment and Driver traits for
//! deterministic, reproducible testing of connection drops, refused
//! connections, backoff timing and frame dispatch.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the session
//! invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    Invariant, InvariantRegistry, InvariantResult, PendingOnlyWhenClosed, RetryCeiling,
    StatusKeysIncreasing, SystemSnapshot, TranscriptAppendOnly, Violation,
};
pub use sim_driver::{SimDriver, SimDriverError, SimStep};
pub use sim_env::{SIM_EPOCH_MILLIS, SimEnv, SimInstant};
pub use sim_server::SimServer;
