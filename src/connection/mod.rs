//! Connection lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Adapter needs a live handle:
//!     get_connection(name, factory)
//!     → Connected: return cached handle
//!     → Connecting: await the in-flight attempt (coalescing)
//!     → otherwise: start an attempt (retry + per-try timeout)
//!
//! Teardown:
//!     disconnect(name) → purge handle, then best-effort graceful close
//!     cleanup() → disconnect every entry in Error state
//! ```
//!
//! # Design Decisions
//! - At most one in-flight attempt per name; concurrent callers share it
//! - Callers get `None` on failure, never an error to handle; a missing
//!   handle is a retryable condition by contract
//! - The manager owns every handle; adapters borrow `Arc` clones

pub mod handle;
pub mod manager;

pub use handle::{downcast_handle, ManagedHandle};
pub use manager::{ConnectionManager, ConnectionState, ConnectionStatus, FactoryError};
