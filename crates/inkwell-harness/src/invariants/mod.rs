//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties of a chat session that must hold after every
//! step, whatever the interleaving of host commands, frames, drops and timer
//! expiries. [`crate::SimDriver`] checks them on every render.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let state = SystemSnapshot::step(before, session.snapshot());
//! registry.assert_all(&state, "after reconnect");
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{PendingOnlyWhenClosed, RetryCeiling, StatusKeysIncreasing, TranscriptAppendOnly};
pub use snapshot::SystemSnapshot;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant and what was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// What was observed.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property checked against each observation of a session.
pub trait Invariant: Send + Sync {
    /// Name used in violation reports.
    fn name(&self) -> &'static str;

    /// Check the observation. Returns a [`Violation`] if the property fails.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Set of invariants checked together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl InvariantRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every session invariant:
    ///
    /// - [`TranscriptAppendOnly`]
    /// - [`RetryCeiling`]
    /// - [`PendingOnlyWhenClosed`]
    /// - [`StatusKeysIncreasing`]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(TranscriptAppendOnly);
        registry.add(RetryCeiling);
        registry.add(PendingOnlyWhenClosed);
        registry.add(StatusKeysIncreasing);
        registry
    }

    /// Register an invariant.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Names of the registered invariants, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.invariants.iter().map(|inv| inv.name())
    }

    /// Run every invariant. Returns all violations found.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every invariant and panic with all violations and `context`.
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Whether no invariants are registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use inkwell_app::SessionSnapshot;
    use inkwell_core::ConnectionState;

    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 4);
        assert!(registry.names().any(|name| name == "RetryCeiling"));
    }

    #[test]
    fn fresh_session_passes_invariants() {
        let snapshot = SessionSnapshot {
            messages: vec![],
            statuses: vec![],
            state: ConnectionState::Idle,
            loading: false,
            retries: 0,
            max_retries: 3,
            reconnect_pending: false,
            input: String::new(),
        };
        assert!(InvariantRegistry::standard().check_all(&SystemSnapshot::initial(snapshot)).is_ok());
    }
}
