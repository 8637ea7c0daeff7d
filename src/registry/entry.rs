//! Per-service health bookkeeping.
//!
//! # Responsibilities
//! - Represent one registered dependency
//! - Track status, failure streak and last error
//! - Derive the next eligible check time from the failure count

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ProbeError;
use crate::probes::HealthProbe;
use crate::resilience::BackoffPolicy;

/// Health status of a monitored service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

/// One registered dependency.
///
/// Mutated only through [`ServiceEntry::apply_result`] (probe completions)
/// and the registry's circuit-breaker deferral; the status/failure-count
/// invariant holds because both fields change in the same place.
pub struct ServiceEntry {
    pub(crate) probe: Arc<dyn HealthProbe>,
    pub(crate) status: ServiceStatus,
    pub(crate) last_checked_at: Option<DateTime<Utc>>,
    pub(crate) consecutive_failures: u32,
    pub(crate) next_eligible_at: Instant,
    pub(crate) last_error: Option<String>,
}

impl ServiceEntry {
    /// New entries start unhealthy with no completed check, eligible for
    /// an immediate first probe.
    pub(crate) fn new(probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            probe,
            status: ServiceStatus::Unhealthy,
            last_checked_at: None,
            consecutive_failures: 0,
            next_eligible_at: Instant::now(),
            last_error: None,
        }
    }

    /// Apply a completed probe outcome and recompute eligibility.
    pub(crate) fn apply_result(
        &mut self,
        result: &Result<(), ProbeError>,
        backoff: &BackoffPolicy,
    ) -> ServiceStatus {
        self.last_checked_at = Some(Utc::now());
        match result {
            Ok(()) => {
                self.status = ServiceStatus::Healthy;
                self.consecutive_failures = 0;
                self.last_error = None;
            }
            Err(e) => {
                self.status = ServiceStatus::Unhealthy;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.last_error = Some(e.to_string());
            }
        }
        self.next_eligible_at = Instant::now() + backoff.delay_for_failures(self.consecutive_failures);
        self.status
    }
}

/// Read-only health report row, served from the cached snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub name: String,
    pub status: ServiceStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    /// Milliseconds until the next scheduled background check becomes
    /// eligible; zero when already due.
    pub next_check_in_ms: u64,
    pub last_error: Option<String>,
}
