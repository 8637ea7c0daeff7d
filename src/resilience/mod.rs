//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe completes:
//!     → backoff.rs (derive next eligible check time from failure count)
//!     → circuit_breaker.rs (past threshold: stop probing, grow cool-down)
//!
//! Startup barrier / connection retries:
//!     → backoff.rs (jittered sleep between attempts)
//! ```
//!
//! # Design Decisions
//! - The eligibility schedule is deterministic: one function of the
//!   consecutive-failure count, shared by every caller
//! - Jitter only on sleeps, never on the recorded eligibility time
//! - Circuit breaker is per-service, not global

pub mod backoff;
pub mod circuit_breaker;

pub use backoff::BackoffPolicy;
pub use circuit_breaker::CircuitBreaker;
