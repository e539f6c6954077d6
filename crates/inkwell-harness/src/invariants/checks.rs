//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use inkwell_core::ConnectionState;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// The transcript only ever grows at the end.
///
/// The previous transcript must be a prefix of the current one. Entries are
/// never reordered, edited or removed.
pub struct TranscriptAppendOnly;

impl Invariant for TranscriptAppendOnly {
    fn name(&self) -> &'static str {
        "TranscriptAppendOnly"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(previous) = &state.previous else {
            return Ok(());
        };

        let before = &previous.messages;
        let after = &state.current.messages;
        if after.len() < before.len() || after[..before.len()] != before[..] {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "transcript rewritten: {} entries before, {} after",
                    before.len(),
                    after.len()
                ),
            });
        }
        Ok(())
    }
}

/// Automatic reconnects never exceed the retry ceiling.
pub struct RetryCeiling;

impl Invariant for RetryCeiling {
    fn name(&self) -> &'static str {
        "RetryCeiling"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let current = &state.current;
        if current.retries > current.max_retries {
            return Err(Violation {
                invariant: self.name(),
                message: format!("retries {} exceed ceiling {}", current.retries, current.max_retries),
            });
        }
        Ok(())
    }
}

/// A reconnect is only ever pending while the connection is closed.
///
/// A pending reconnect alongside a live attempt would open a second socket.
pub struct PendingOnlyWhenClosed;

impl Invariant for PendingOnlyWhenClosed {
    fn name(&self) -> &'static str {
        "PendingOnlyWhenClosed"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let current = &state.current;
        if current.reconnect_pending && current.state != ConnectionState::Closed {
            return Err(Violation {
                invariant: self.name(),
                message: format!("reconnect pending while {:?}", current.state),
            });
        }
        Ok(())
    }
}

/// Processing-status keys are unique and strictly increasing.
pub struct StatusKeysIncreasing;

impl Invariant for StatusKeysIncreasing {
    fn name(&self) -> &'static str {
        "StatusKeysIncreasing"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for window in state.current.statuses.windows(2) {
            if window[1].timestamp <= window[0].timestamp {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "status key {} follows {}",
                        window[1].timestamp, window[0].timestamp
                    ),
                });
            }
        }
        Ok(())
    }
}
