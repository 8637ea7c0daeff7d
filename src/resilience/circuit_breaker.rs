//! Circuit breaker for persistently failing dependencies.
//!
//! # States
//! - Closed: checks run on the normal backoff schedule
//! - Open: checks are skipped entirely; eligibility is pushed out by a
//!   cool-down that grows with the failure count
//!
//! # Design Decisions
//! - State is derived from the consecutive-failure count the registry
//!   already tracks; the breaker itself holds no mutable state
//! - Recovery relies on the monitor loop's long-interval rescan picking the
//!   service up once the cool-down elapses

use std::time::Duration;

/// Base cool-down once the circuit first opens.
const OPEN_BASE_MS: u64 = 30_000;

/// Per-service circuit-breaker policy.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreaker {
    threshold: u32,
    max_open: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, max_open: Duration) -> Self {
        Self { threshold, max_open }
    }

    /// Whether checks should be skipped for this failure count.
    pub fn is_open(&self, consecutive_failures: u32) -> bool {
        consecutive_failures > self.threshold
    }

    /// Cool-down before the next check is allowed while the circuit is
    /// open. Doubles per failure past the threshold, capped at `max_open`.
    pub fn cooldown(&self, consecutive_failures: u32) -> Duration {
        let over = consecutive_failures.saturating_sub(self.threshold);
        let shift = over.saturating_sub(1).min(16);
        let ms = OPEN_BASE_MS.saturating_mul(1u64 << shift);
        Duration::from_millis(ms).min(self.max_open)
    }
}
