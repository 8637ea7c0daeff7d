//! Probe capability contract and built-in adapters.
//!
//! # Design Decisions
//! - A monitored dependency exposes exactly one capability: answer a
//!   liveness probe. Wire protocols stay inside the adapter
//! - Probes impose no deadline of their own; the bound is applied by the
//!   checker racing the probe against a timer
//! - Adapters are registered once per service; the registry holds them as
//!   shared trait objects

pub mod http;
pub mod tcp;

pub use http::HttpProbe;
pub use tcp::TcpProbe;

use async_trait::async_trait;

use crate::error::ProbeError;

/// A liveness check against an external dependency.
///
/// `Ok(())` means healthy. Implementations answer at their own pace; the
/// caller is responsible for bounding the wait.
#[async_trait]
pub trait HealthProbe: Send + Sync + 'static {
    async fn probe(&self) -> Result<(), ProbeError>;
}
