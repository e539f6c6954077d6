//! Per-attempt client identifiers.

use std::fmt;

use crate::env::Environment;

/// Length of the random base36 suffix.
const SUFFIX_LEN: usize = 9;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Identifier for one connection attempt.
///
/// Format: `{unix_millis}-{9 base36 chars}`. A fresh identifier is generated
/// for every attempt, so transport events can be attributed to the attempt
/// that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier from the environment's clock and RNG.
    pub fn generate<E: Environment>(env: &E) -> Self {
        let millis = env.wall_clock_millis();
        let mut entropy = env.random_u64();

        let mut suffix = String::with_capacity(SUFFIX_LEN);
        for _ in 0..SUFFIX_LEN {
            suffix.push(char::from(BASE36[(entropy % 36) as usize]));
            entropy /= 36;
        }

        Self(format!("{millis}-{suffix}"))
    }

    /// Identifier as a string slice (for the endpoint path).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        future::Future,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    };

    use super::*;

    #[derive(Clone, Default)]
    struct CountingEnv {
        counter: Arc<AtomicU64>,
    }

    impl Environment for CountingEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            Instant::now()
        }

        fn sleep(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
            async {}
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = (n as u8).wrapping_mul(31).wrapping_add(i as u8);
            }
        }

        fn wall_clock_millis(&self) -> u64 {
            1_700_000_000_000
        }
    }

    #[test]
    fn format_is_timestamp_dash_suffix() {
        let id = ClientId::generate(&CountingEnv::default());
        let (millis, suffix) = id.as_str().split_once('-').unwrap();

        assert_eq!(millis, "1700000000000");
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }

    #[test]
    fn consecutive_ids_differ() {
        let env = CountingEnv::default();
        let first = ClientId::generate(&env);
        let second = ClientId::generate(&env);
        assert_ne!(first, second);
    }
}
