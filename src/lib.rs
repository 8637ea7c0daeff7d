//! Service health supervision and connection lifecycle library.

pub mod admin;
pub mod config;
pub mod connection;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod probes;
pub mod registry;
pub mod resilience;

pub use config::MonitorConfig;
pub use connection::ConnectionManager;
pub use health::{BoundedChecker, HealthMonitor, ReconnectionQueue, ReconnectionScheduler};
pub use lifecycle::Shutdown;
pub use registry::ServiceRegistry;
