//! Simulated environment: virtual clock and seeded randomness.
//!
//! Time only moves when a test (or [`crate::SimDriver`]) advances it, and all
//! randomness comes from a ChaCha stream, so a seed fully determines a run.

use std::{
    future::Future,
    ops::{Add, Sub},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use inkwell_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Wall-clock time at virtual instant zero (2023-11-14T22:13:20Z).
pub const SIM_EPOCH_MILLIS: u64 = 1_700_000_000_000;

/// Point in virtual time, measured from the start of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time since the start of the simulation.
    pub fn elapsed_since_start(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Deterministic [`Environment`] for simulation tests.
///
/// Clones share the same clock and RNG.
#[derive(Debug, Clone)]
pub struct SimEnv {
    clock: Arc<Mutex<Duration>>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl SimEnv {
    /// Environment at virtual time zero with RNG seeded from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            clock: Arc::new(Mutex::new(Duration::ZERO)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Move virtual time forward.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock = clock.saturating_add(by);
    }

    /// Virtual time elapsed since the start of the simulation.
    pub fn elapsed(&self) -> Duration {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.elapsed())
    }

    /// Advances virtual time immediately; the returned future is ready.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        async {}
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }

    fn wall_clock_millis(&self) -> u64 {
        SIM_EPOCH_MILLIS + self.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_moves_only_when_advanced() {
        let env = SimEnv::with_seed(1);
        let start = env.now();
        assert_eq!(env.now(), start);

        env.advance(Duration::from_millis(1500));
        assert_eq!(env.now() - start, Duration::from_millis(1500));
        assert_eq!(env.wall_clock_millis(), SIM_EPOCH_MILLIS + 1500);
    }

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::with_seed(1);
        let clone = env.clone();
        clone.advance(Duration::from_secs(3));
        assert_eq!(env.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(42);
        let b = SimEnv::with_seed(42);
        assert_eq!(a.random_u64(), b.random_u64());

        let c = SimEnv::with_seed(43);
        assert_ne!(SimEnv::with_seed(42).random_u64(), c.random_u64());
    }

    #[tokio::test]
    async fn sleep_advances_virtual_time() {
        let env = SimEnv::default();
        env.sleep(Duration::from_secs(2)).await;
        assert_eq!(env.elapsed(), Duration::from_secs(2));
    }
}
