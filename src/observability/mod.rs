//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, service/connection names)
//!     → metrics.rs (gauges and counters)
//!
//! Consumers:
//!     → Log aggregation (stdout via tracing-subscriber)
//!     → Whatever metrics recorder the embedder installs
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap (facade over atomic recorders)
//! - Exposition is out of scope; this crate only records

pub mod metrics;
