//! Backoff schedules for health checks and retries.

use rand::Rng;
use std::time::Duration;

/// Deterministic capped exponential schedule.
///
/// `next_eligible_check_at` is always `now + delay_for_failures(n)`.
/// Keeping the derivation in one place keeps backoff bookkeeping consistent
/// whether a check was triggered by the startup barrier, the background
/// loop, or an ad-hoc sweep.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Base delay applied after a successful check (failure count 0).
    pub initial_delay_ms: u64,
    /// Ceiling for the derived delay.
    pub max_delay_ms: u64,
    /// Growth factor per consecutive failure.
    pub multiplier: f64,
}

impl BackoffPolicy {
    /// Delay before the next eligible check given the consecutive-failure
    /// count. Monotonically non-decreasing in the failure count, capped at
    /// `max_delay_ms`.
    pub fn delay_for_failures(&self, consecutive_failures: u32) -> Duration {
        // Exponent clamped; past ~32 doublings the cap has long since won.
        let exp = self.multiplier.max(1.0).powi(consecutive_failures.min(32) as i32);
        let raw = (self.initial_delay_ms as f64 * exp) as u64;
        Duration::from_millis(raw.min(self.max_delay_ms))
    }
}

/// Jittered exponential backoff delay for retry sleeps.
///
/// Attempt 0 returns zero so first attempts run immediately. Jitter adds up
/// to 10% of the capped delay to spread concurrent retries apart.
pub fn calculate_backoff(attempt: u32, base_ms: u64, multiplier: f64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exp = multiplier.max(1.0).powi((attempt - 1).min(32) as i32);
    let delay_ms = (base_ms as f64 * exp) as u64;
    let capped = delay_ms.min(max_ms);

    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}
