//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! supervisor. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

use crate::resilience::BackoffPolicy;

/// Root configuration for the health supervisor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Startup barrier retry settings.
    pub startup: StartupConfig,

    /// Health check and background monitor settings.
    pub health_check: HealthCheckConfig,

    /// Managed connection settings.
    pub connection: ConnectionConfig,

    /// Diagnostics endpoint settings.
    pub admin: AdminConfig,

    /// Monitored service definitions.
    pub services: Vec<ServiceConfig>,
}

/// Startup barrier configuration (per-service retry before traffic is
/// admitted).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Attempts per service before recording it unhealthy and moving on.
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds.
    pub initial_delay_ms: u64,

    /// Ceiling for the between-attempt delay in milliseconds.
    pub max_delay_ms: u64,

    /// Growth factor per attempt.
    pub backoff_multiplier: f64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Deadline imposed on each probe in milliseconds.
    pub probe_timeout_ms: u64,

    /// Base check-eligibility delay in milliseconds (failure count 0).
    pub initial_delay_ms: u64,

    /// Ceiling for the eligibility delay in milliseconds.
    pub max_delay_ms: u64,

    /// Eligibility delay growth factor per consecutive failure.
    pub backoff_multiplier: f64,

    /// Consecutive failures before the circuit opens and probes stop.
    pub circuit_breaker_threshold: u32,

    /// Ceiling for the open-circuit cool-down in seconds.
    pub circuit_max_open_secs: u64,

    /// Maximum queued services drained per monitor cycle.
    pub batch_size: usize,

    /// Loop sleep while reconnection work is pending, in milliseconds.
    pub busy_interval_ms: u64,

    /// Loop sleep while the queue is empty, in milliseconds.
    pub idle_interval_ms: u64,

    /// Per-cycle probability of rescanning all services for ones past
    /// their eligibility time that nothing re-queued.
    pub rescan_probability: f32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 3000,
            initial_delay_ms: 1000,
            max_delay_ms: 60_000,
            backoff_multiplier: 2.0,
            circuit_breaker_threshold: 5,
            circuit_max_open_secs: 300,
            batch_size: 4,
            busy_interval_ms: 250,
            idle_interval_ms: 2000,
            rescan_probability: 0.1,
        }
    }
}

impl HealthCheckConfig {
    /// The deterministic eligibility schedule derived from this config.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_delay_ms: self.initial_delay_ms,
            max_delay_ms: self.max_delay_ms,
            multiplier: self.backoff_multiplier,
        }
    }
}

/// Managed connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Sequential tries before a connection attempt gives up.
    pub max_retries: u32,

    /// Base linear-backoff delay between tries in milliseconds.
    pub retry_delay_ms: u64,

    /// Deadline per factory invocation in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 500,
            connect_timeout_ms: 5000,
        }
    }
}

/// Diagnostics endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the diagnostics endpoint.
    pub enabled: bool,

    /// Diagnostics endpoint bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// A monitored service definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service name.
    pub name: String,

    /// Probe adapter to use.
    pub kind: ServiceKind,

    /// Probe target: a socket address for `tcp`, a URL for `http`.
    pub target: String,
}

/// Built-in probe adapter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Tcp,
    Http,
}
