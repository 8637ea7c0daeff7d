//! Bounded probe execution.
//!
//! # Responsibilities
//! - Race each probe against a caller-supplied deadline
//! - Funnel every completed probe through the registry's single
//!   transition path, whoever triggered the check

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::error::ProbeError;
use crate::observability::metrics;
use crate::registry::{ServiceRegistry, ServiceStatus};

/// Runs probes with an imposed deadline and records the outcome.
#[derive(Clone)]
pub struct BoundedChecker {
    registry: Arc<ServiceRegistry>,
}

impl BoundedChecker {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Probe `name` with a deadline and record the result. Returns the
    /// recorded status, or `None` if the service is not registered.
    ///
    /// A probe that outlives the deadline is abandoned, not cancelled; its
    /// eventual completion is discarded.
    pub async fn check_with_timeout(&self, name: &str, timeout: Duration) -> Option<ServiceStatus> {
        let probe = self.registry.probe_of(name)?;

        let result = match time::timeout(timeout, probe.probe()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::warn!(service = %name, error = %e, "Probe failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(
                    service = %name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Probe timed out"
                );
                Err(ProbeError::Timeout)
            }
        };

        metrics::record_probe_outcome(name, &result);
        self.registry.record_result(name, result)
    }
}
