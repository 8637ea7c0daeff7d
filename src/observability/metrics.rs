//! Metrics recording for the supervision subsystem.
//!
//! # Metrics
//! - `supervisor_service_health` (gauge): 1=healthy, 0=unhealthy
//! - `supervisor_probe_total` (counter): probes by service and outcome
//! - `supervisor_connection_transitions_total` (counter): connection state
//!   transitions by name and resulting state

use metrics::{counter, gauge};

use crate::error::ProbeError;

pub fn record_service_health(service: &str, healthy: bool) {
    gauge!("supervisor_service_health", "service" => service.to_owned())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_probe_outcome(service: &str, result: &Result<(), ProbeError>) {
    let outcome = match result {
        Ok(()) => "ok",
        Err(ProbeError::Timeout) => "timeout",
        Err(ProbeError::Failed(_)) => "failed",
    };
    counter!(
        "supervisor_probe_total",
        "service" => service.to_owned(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_connection_transition(connection: &str, state: &'static str) {
    counter!(
        "supervisor_connection_transitions_total",
        "connection" => connection.to_owned(),
        "state" => state
    )
    .increment(1);
}
