//! Error taxonomy for the supervision subsystem.
//!
//! # Design Decisions
//! - Every failure here is recovered locally: callers observe state
//!   transitions (`Unhealthy`, `Error`) and log events, never panics
//! - Probe and connection failures keep a human-readable cause so the
//!   diagnostics report can show the last error per service

use thiserror::Error;

/// Failure of a single health probe.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The probe did not answer within the imposed deadline.
    #[error("probe timed out")]
    Timeout,

    /// The probe answered negatively or failed outright.
    #[error("probe failed: {0}")]
    Failed(String),
}

/// Failure to establish a managed connection.
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    /// A single factory invocation exceeded the per-attempt deadline.
    #[error("connection attempt timed out")]
    Timeout,

    /// The factory itself failed.
    #[error("connection factory failed: {0}")]
    Factory(String),

    /// Every retry failed; carries the last cause.
    #[error("connection failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// A previously cached connection failed a liveness re-check.
#[derive(Debug, Error)]
#[error("connection validation failed: {0}")]
pub struct ValidationFailure(pub String);
