//! Reconnection work queue.
//!
//! # Responsibilities
//! - Deduplicate pending service names (a queued name is never queued
//!   twice)
//! - Hold each name back until its throttle delay elapses
//! - Hand the monitor loop a bounded batch of due names per cycle

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Scheduling throttle: one second per consecutive failure, capped at 15s.
const THROTTLE_STEP_MS: u64 = 1_000;
const THROTTLE_CAP_MS: u64 = 15_000;

pub(crate) fn throttle_delay(consecutive_failures: u32) -> Duration {
    let ms = THROTTLE_STEP_MS
        .saturating_mul(consecutive_failures as u64)
        .min(THROTTLE_CAP_MS);
    Duration::from_millis(ms)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingState {
    /// Waiting for its eligibility time; drained once due.
    Queued { eligible_at: Instant },
    /// Handed to the monitor loop; re-queued or cleared on completion.
    Checking,
}

/// Deduplicated set of service names awaiting a background retry.
///
/// A name absent from the map is idle. Present names hold their state
/// machine position (`Queued` or `Checking`).
#[derive(Debug, Default)]
pub struct ReconnectionQueue {
    pending: DashMap<String, PendingState>,
}

impl ReconnectionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue unless the name is already queued or being checked.
    /// Returns whether the name was newly queued.
    pub fn try_enqueue(&self, name: &str, delay: Duration) -> bool {
        let mut inserted = false;
        self.pending.entry(name.to_string()).or_insert_with(|| {
            inserted = true;
            PendingState::Queued {
                eligible_at: Instant::now() + delay,
            }
        });
        inserted
    }

    /// Move up to `batch` due names from `Queued` to `Checking`.
    pub fn drain_due(&self, batch: usize) -> Vec<String> {
        let now = Instant::now();
        let mut due = Vec::new();
        for mut item in self.pending.iter_mut() {
            if due.len() >= batch {
                break;
            }
            if let PendingState::Queued { eligible_at } = *item.value() {
                if eligible_at <= now {
                    *item.value_mut() = PendingState::Checking;
                    due.push(item.key().clone());
                }
            }
        }
        due
    }

    /// Check finished; the name returns to idle.
    pub fn finish(&self, name: &str) {
        self.pending.remove(name);
    }

    /// Failed check: back to `Queued`, eligible after `delay`.
    pub fn requeue(&self, name: &str, delay: Duration) {
        self.pending.insert(
            name.to_string(),
            PendingState::Queued {
                eligible_at: Instant::now() + delay,
            },
        );
    }

    /// Drop any pending work for the name (service removal).
    pub fn purge(&self, name: &str) {
        self.pending.remove(name);
    }

    pub fn is_pending(&self, name: &str) -> bool {
        self.pending.contains_key(name)
    }

    /// Number of names currently waiting in `Queued`.
    pub fn queued_len(&self) -> usize {
        self.pending
            .iter()
            .filter(|item| matches!(item.value(), PendingState::Queued { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_is_idempotent() {
        let queue = ReconnectionQueue::new();
        assert!(queue.try_enqueue("db", Duration::ZERO));
        assert!(!queue.try_enqueue("db", Duration::ZERO));
        assert_eq!(queue.queued_len(), 1);
    }

    #[test]
    fn test_drain_respects_delay_and_batch() {
        let queue = ReconnectionQueue::new();
        queue.try_enqueue("a", Duration::ZERO);
        queue.try_enqueue("b", Duration::ZERO);
        queue.try_enqueue("c", Duration::ZERO);
        queue.try_enqueue("later", Duration::from_secs(60));

        let first = queue.drain_due(2);
        assert_eq!(first.len(), 2);
        let second = queue.drain_due(2);
        assert_eq!(second.len(), 1);
        // "later" is not yet eligible.
        assert!(queue.drain_due(2).is_empty());
        assert!(queue.is_pending("later"));
    }

    #[test]
    fn test_checking_names_are_not_redrained() {
        let queue = ReconnectionQueue::new();
        queue.try_enqueue("db", Duration::ZERO);
        assert_eq!(queue.drain_due(4), vec!["db".to_string()]);
        // Now Checking: neither drainable nor re-enqueueable.
        assert!(queue.drain_due(4).is_empty());
        assert!(!queue.try_enqueue("db", Duration::ZERO));

        queue.requeue("db", Duration::ZERO);
        assert_eq!(queue.drain_due(4), vec!["db".to_string()]);
        queue.finish("db");
        assert!(!queue.is_pending("db"));
    }

    #[test]
    fn test_throttle_delay_caps() {
        assert_eq!(throttle_delay(0), Duration::ZERO);
        assert_eq!(throttle_delay(3), Duration::from_secs(3));
        assert_eq!(throttle_delay(40), Duration::from_secs(15));
    }
}
