//! Background reconnection monitor.
//!
//! # Responsibilities
//! - Drive the throttled reconnection queue from one cooperative loop
//! - Run each cycle's checks concurrently, gathering results before the
//!   next cycle
//! - Apply the circuit breaker to persistently failing services
//! - Occasionally rescan all entries for ones past their eligibility time
//!   that nothing re-queued

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::registry::{ServiceRegistry, ServiceStatus};
use crate::resilience::CircuitBreaker;

use super::checker::BoundedChecker;
use super::queue::{throttle_delay, ReconnectionQueue};

/// Handle for requesting a background retry of a service.
///
/// Cheap to clone; adapters hold one wherever they observe a dependency
/// failing outside the polling cadence.
#[derive(Clone)]
pub struct ReconnectionScheduler {
    registry: Arc<ServiceRegistry>,
    queue: Arc<ReconnectionQueue>,
}

impl ReconnectionScheduler {
    /// Queue `name` for a background check, throttled by its current
    /// failure count. No-op while the name is already queued or being
    /// checked, and for unregistered names.
    pub fn schedule_reconnection(&self, name: &str) {
        let Some(failures) = self.registry.failure_count(name) else {
            return;
        };
        if self.queue.try_enqueue(name, throttle_delay(failures)) {
            tracing::debug!(service = %name, failures, "Queued for reconnection");
        }
    }
}

/// The background monitor loop.
pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    checker: BoundedChecker,
    queue: Arc<ReconnectionQueue>,
    breaker: CircuitBreaker,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        checker: BoundedChecker,
        queue: Arc<ReconnectionQueue>,
        config: HealthCheckConfig,
    ) -> Self {
        let breaker = CircuitBreaker::new(
            config.circuit_breaker_threshold,
            Duration::from_secs(config.circuit_max_open_secs),
        );
        Self {
            registry,
            checker,
            queue,
            breaker,
            config,
        }
    }

    /// Handle for enqueueing reconnection work from elsewhere.
    pub fn scheduler(&self) -> ReconnectionScheduler {
        ReconnectionScheduler {
            registry: self.registry.clone(),
            queue: self.queue.clone(),
        }
    }

    /// Run until the shutdown signal fires. Sleeps briefly while work is
    /// pending, longer when idle.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            batch_size = self.config.batch_size,
            circuit_breaker_threshold = self.config.circuit_breaker_threshold,
            "Health monitor starting"
        );

        loop {
            let interval = if self.queue.queued_len() > 0 {
                Duration::from_millis(self.config.busy_interval_ms)
            } else {
                Duration::from_millis(self.config.idle_interval_ms)
            };

            tokio::select! {
                _ = time::sleep(interval) => {
                    self.cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn cycle(&self) {
        let batch = self.queue.drain_due(self.config.batch_size);
        if !batch.is_empty() {
            join_all(
                batch
                    .iter()
                    .map(|name| self.attempt_reconnection(name)),
            )
            .await;
        }

        // Catch long-idle services: anything past its eligibility time that
        // nothing re-queued (circuit cool-downs expire through this path).
        if fastrand::f32() < self.config.rescan_probability {
            for name in self.registry.due_names(Instant::now()) {
                self.queue.try_enqueue(&name, Duration::ZERO);
            }
        }
    }

    /// Handle one dequeued name. Never propagates; a misbehaving
    /// dependency only affects its own entry.
    async fn attempt_reconnection(&self, name: &str) {
        let Some(view) = self.registry.view(name) else {
            // Removed while queued.
            self.queue.purge(name);
            return;
        };

        if self.breaker.is_open(view.consecutive_failures) {
            let cooldown = self.breaker.cooldown(view.consecutive_failures);
            self.registry.defer_check(name, cooldown);
            self.queue.finish(name);
            tracing::warn!(
                service = %name,
                failures = view.consecutive_failures,
                cooldown_ms = cooldown.as_millis() as u64,
                "Circuit open, skipping probe"
            );
            return;
        }

        let now = Instant::now();
        if now < view.next_eligible_at {
            // Not yet due; hold it in the queue until eligibility.
            self.queue
                .requeue(name, view.next_eligible_at.saturating_duration_since(now));
            return;
        }

        let timeout = Duration::from_millis(self.config.probe_timeout_ms);
        match self.checker.check_with_timeout(name, timeout).await {
            Some(ServiceStatus::Unhealthy) => {
                let failures = self.registry.failure_count(name).unwrap_or(0);
                self.queue.requeue(name, throttle_delay(failures));
            }
            // Recovered, or removed mid-check.
            Some(ServiceStatus::Healthy) | None => {
                self.queue.finish(name);
            }
        }
    }
}
