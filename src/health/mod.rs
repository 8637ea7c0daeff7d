//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Bounded checks (checker.rs):
//!     Caller-supplied deadline
//!     → Race probe against timer
//!     → Record outcome in the registry
//!
//! Reconnection queue (queue.rs):
//!     schedule_reconnection(name)
//!     → Deduplicated, throttled pending set
//!     → Idle → Queued → Checking → Idle | Queued-after-delay
//!
//! Background monitor (monitor.rs):
//!     Single cooperative loop
//!     → Drain a bounded batch each cycle
//!     → Circuit-break persistent failures
//!     → Occasionally rescan for long-idle services
//! ```
//!
//! # Design Decisions
//! - One loop for all services, not one task per service
//! - A slow probe is abandoned at the deadline, never cancelled
//! - Batch-limited drains keep one noisy dependency from starving others

pub mod checker;
pub mod monitor;
pub mod queue;

pub use checker::BoundedChecker;
pub use monitor::{HealthMonitor, ReconnectionScheduler};
pub use queue::ReconnectionQueue;
