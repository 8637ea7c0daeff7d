//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Register services → Startup barrier
//!     → Spawn monitor loop → Serve diagnostics
//!
//! Shutdown:
//!     Signal received → Broadcast to monitor loop and diagnostics server
//!     → Clean up errored connections → Exit
//! ```
//!
//! # Design Decisions
//! - The startup barrier never aborts the process; degraded dependencies
//!   are gated downstream by the readiness guard
//! - Shutdown is one broadcast; every long-running task subscribes

pub mod shutdown;

pub use shutdown::Shutdown;
