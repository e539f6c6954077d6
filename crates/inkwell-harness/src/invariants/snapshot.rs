//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time,
//! together with the previous observation so transition properties can be
//! checked. Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use inkwell_app::SessionSnapshot;

/// One observation of a session, plus the one before it.
#[derive(Debug, Clone)]
pub struct SystemSnapshot {
    /// Previous observation. `None` for the first one.
    pub previous: Option<SessionSnapshot>,
    /// Current observation.
    pub current: SessionSnapshot,
}

impl SystemSnapshot {
    /// First observation of a session.
    pub fn initial(current: SessionSnapshot) -> Self {
        Self { previous: None, current }
    }

    /// Observation following `previous`.
    pub fn step(previous: SessionSnapshot, current: SessionSnapshot) -> Self {
        Self { previous: Some(previous), current }
    }
}
