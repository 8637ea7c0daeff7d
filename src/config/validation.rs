//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (timeouts > 0, probabilities in [0, 1])
//! - Detect duplicate service names and unparseable targets
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: MonitorConfig → Result<(), Vec<_>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use super::schema::{MonitorConfig, ServiceKind};

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(errors: &mut Vec<ValidationError>, field: &str, message: impl Into<String>) {
    errors.push(ValidationError {
        field: field.to_string(),
        message: message.into(),
    });
}

/// Validate a configuration, collecting every violation.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.startup.max_attempts == 0 {
        err(&mut errors, "startup.max_attempts", "must be at least 1");
    }
    if config.startup.backoff_multiplier < 1.0 {
        err(&mut errors, "startup.backoff_multiplier", "must be >= 1.0");
    }

    let hc = &config.health_check;
    if hc.probe_timeout_ms == 0 {
        err(&mut errors, "health_check.probe_timeout_ms", "must be > 0");
    }
    if hc.backoff_multiplier < 1.0 {
        err(&mut errors, "health_check.backoff_multiplier", "must be >= 1.0");
    }
    if hc.max_delay_ms < hc.initial_delay_ms {
        err(
            &mut errors,
            "health_check.max_delay_ms",
            "must be >= initial_delay_ms",
        );
    }
    if hc.batch_size == 0 {
        err(&mut errors, "health_check.batch_size", "must be at least 1");
    }
    if !(0.0..=1.0).contains(&hc.rescan_probability) {
        err(
            &mut errors,
            "health_check.rescan_probability",
            "must be within [0.0, 1.0]",
        );
    }

    if config.connection.max_retries == 0 {
        err(&mut errors, "connection.max_retries", "must be at least 1");
    }
    if config.connection.connect_timeout_ms == 0 {
        err(&mut errors, "connection.connect_timeout_ms", "must be > 0");
    }

    if config.admin.enabled && config.admin.bind_address.parse::<SocketAddr>().is_err() {
        err(
            &mut errors,
            "admin.bind_address",
            format!("not a socket address: {}", config.admin.bind_address),
        );
    }

    let mut seen = HashSet::new();
    for service in &config.services {
        if service.name.is_empty() {
            err(&mut errors, "services.name", "must not be empty");
            continue;
        }
        if !seen.insert(service.name.as_str()) {
            err(
                &mut errors,
                "services.name",
                format!("duplicate service name: {}", service.name),
            );
        }
        match service.kind {
            ServiceKind::Tcp => {
                if service.target.parse::<SocketAddr>().is_err() {
                    err(
                        &mut errors,
                        "services.target",
                        format!("{}: not a socket address: {}", service.name, service.target),
                    );
                }
            }
            ServiceKind::Http => {
                if Url::parse(&service.target).is_err() {
                    err(
                        &mut errors,
                        "services.target",
                        format!("{}: not a URL: {}", service.name, service.target),
                    );
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&MonitorConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = MonitorConfig::default();
        config.startup.max_attempts = 0;
        config.health_check.rescan_probability = 1.5;
        config.services.push(ServiceConfig {
            name: "db".into(),
            kind: ServiceKind::Tcp,
            target: "not-an-address".into(),
        });
        config.services.push(ServiceConfig {
            name: "db".into(),
            kind: ServiceKind::Http,
            target: "http://localhost:5432/health".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
