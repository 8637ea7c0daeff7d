//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! register(name, probe)
//!     → entry.rs (per-service bookkeeping row)
//!     → store.rs (shared map, source of truth)
//!
//! Probe completes (any caller):
//!     → entry.rs apply_result (single transition path)
//!     → status, failure count, eligibility time updated together
//!
//! Request-path guards:
//!     → store.rs cached_snapshot (in-memory read, never probes)
//! ```
//!
//! # Design Decisions
//! - One mutation path for health bookkeeping keeps the backoff
//!   derivation consistent across startup, background loop and sweeps
//! - Snapshot reads never suspend; probing is someone else's job
//! - Removal also purges pending reconnection work for the name

pub mod entry;
pub mod store;

pub use entry::{ServiceHealth, ServiceStatus};
pub use store::ServiceRegistry;
