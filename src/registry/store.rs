//! Service registry: the source of truth for request-path guards.
//!
//! # Responsibilities
//! - Own the service entry map
//! - Serve the cached snapshot without ever probing
//! - Run the startup barrier and ad-hoc full sweeps

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::StartupConfig;
use crate::error::ProbeError;
use crate::health::checker::BoundedChecker;
use crate::health::queue::ReconnectionQueue;
use crate::observability::metrics;
use crate::probes::HealthProbe;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::BackoffPolicy;

use super::entry::{ServiceEntry, ServiceHealth, ServiceStatus};

/// Compact view of one entry's scheduling state, for the monitor loop.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntryView {
    pub consecutive_failures: u32,
    pub next_eligible_at: Instant,
}

/// Holds per-service health state; consumed by guards and the monitor loop.
pub struct ServiceRegistry {
    entries: DashMap<String, ServiceEntry>,
    queue: Arc<ReconnectionQueue>,
    backoff: BackoffPolicy,
}

impl ServiceRegistry {
    pub fn new(backoff: BackoffPolicy, queue: Arc<ReconnectionQueue>) -> Self {
        Self {
            entries: DashMap::new(),
            queue,
            backoff,
        }
    }

    /// Insert a service entry. Re-registering a name replaces its entry,
    /// resetting the failure streak and forcing a fresh first check.
    pub fn register(&self, name: impl Into<String>, probe: Arc<dyn HealthProbe>) {
        let name = name.into();
        tracing::info!(service = %name, "Registering service");
        self.entries.insert(name, ServiceEntry::new(probe));
    }

    /// Delete an entry and any queued reconnection work for it. No-op if
    /// absent.
    pub fn remove(&self, name: &str) {
        if self.entries.remove(name).is_some() {
            tracing::info!(service = %name, "Removed service");
        }
        self.queue.purge(name);
    }

    /// Current in-memory state; never invokes a probe. The only method the
    /// request-serving path may call.
    pub fn cached_snapshot(&self) -> Vec<ServiceHealth> {
        let now = Instant::now();
        let mut rows: Vec<ServiceHealth> = self
            .entries
            .iter()
            .map(|item| {
                let entry = item.value();
                ServiceHealth {
                    name: item.key().clone(),
                    status: entry.status,
                    last_checked_at: entry.last_checked_at,
                    consecutive_failures: entry.consecutive_failures,
                    next_check_in_ms: entry
                        .next_eligible_at
                        .saturating_duration_since(now)
                        .as_millis() as u64,
                    last_error: entry.last_error.clone(),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Whether every registered service is currently healthy.
    pub fn all_healthy(&self) -> bool {
        self.entries
            .iter()
            .all(|item| item.value().status == ServiceStatus::Healthy)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|item| item.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn probe_of(&self, name: &str) -> Option<Arc<dyn HealthProbe>> {
        self.entries.get(name).map(|item| item.value().probe.clone())
    }

    pub(crate) fn failure_count(&self, name: &str) -> Option<u32> {
        self.entries
            .get(name)
            .map(|item| item.value().consecutive_failures)
    }

    pub(crate) fn view(&self, name: &str) -> Option<EntryView> {
        self.entries.get(name).map(|item| EntryView {
            consecutive_failures: item.value().consecutive_failures,
            next_eligible_at: item.value().next_eligible_at,
        })
    }

    /// Names whose eligibility time has passed, for the monitor's rescan.
    pub(crate) fn due_names(&self, now: Instant) -> Vec<String> {
        self.entries
            .iter()
            .filter(|item| item.value().next_eligible_at <= now)
            .map(|item| item.key().clone())
            .collect()
    }

    /// Record a completed probe outcome through the single transition
    /// path. Returns `None` if the service was removed meanwhile.
    pub(crate) fn record_result(
        &self,
        name: &str,
        result: Result<(), ProbeError>,
    ) -> Option<ServiceStatus> {
        let (before, after) = {
            let mut item = self.entries.get_mut(name)?;
            let before = item.value().status;
            let after = item.value_mut().apply_result(&result, &self.backoff);
            (before, after)
        };

        if before != after {
            match after {
                ServiceStatus::Healthy => {
                    tracing::info!(service = %name, "Service recovered")
                }
                ServiceStatus::Unhealthy => {
                    tracing::warn!(service = %name, "Service became unhealthy")
                }
            }
        }
        metrics::record_service_health(name, after == ServiceStatus::Healthy);
        Some(after)
    }

    /// Push the next eligible check out by `cooldown` (circuit breaker).
    pub(crate) fn defer_check(&self, name: &str, cooldown: Duration) {
        if let Some(mut item) = self.entries.get_mut(name) {
            item.value_mut().next_eligible_at = Instant::now() + cooldown;
        }
    }

    /// Blocking startup barrier. Each registered service is attempted up to
    /// `retry.max_attempts` times with jittered exponential backoff between
    /// attempts; a service that never converges is recorded unhealthy and
    /// the barrier moves on. Never fails the caller.
    pub async fn wait_all(
        &self,
        checker: &BoundedChecker,
        retry: &StartupConfig,
        probe_timeout: Duration,
    ) {
        for name in self.names() {
            let mut converged = false;
            for attempt in 0..retry.max_attempts {
                if attempt > 0 {
                    let delay = calculate_backoff(
                        attempt,
                        retry.initial_delay_ms,
                        retry.backoff_multiplier,
                        retry.max_delay_ms,
                    );
                    tokio::time::sleep(delay).await;
                }
                match checker.check_with_timeout(&name, probe_timeout).await {
                    Some(ServiceStatus::Healthy) => {
                        converged = true;
                        break;
                    }
                    Some(ServiceStatus::Unhealthy) => {}
                    // Removed while the barrier was running.
                    None => break,
                }
            }
            if !converged {
                tracing::warn!(
                    service = %name,
                    attempts = retry.max_attempts,
                    "Service did not become healthy during startup"
                );
            }
        }
        let healthy = self
            .cached_snapshot()
            .iter()
            .filter(|s| s.status == ServiceStatus::Healthy)
            .count();
        tracing::info!(services = self.len(), healthy, "Startup barrier complete");
    }

    /// Ad-hoc full sweep: probe every service with the bounded checker and
    /// return the fresh snapshot. Per-service failures are recorded, not
    /// propagated.
    pub async fn check_all(
        &self,
        checker: &BoundedChecker,
        timeout_per_service: Duration,
    ) -> Vec<ServiceHealth> {
        for name in self.names() {
            let _ = checker.check_with_timeout(&name, timeout_per_service).await;
        }
        self.cached_snapshot()
    }
}
