//! Managed connection handle contract.
//!
//! # Design Decisions
//! - The source's duck-typed "has a close/disconnect/destroy method"
//!   becomes one trait with a default no-op close, checked at the type
//!   level instead of per call
//! - `as_any` lets adapters recover their concrete type from the shared
//!   cache without the manager knowing about it

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

/// A live connection owned by the connection manager.
///
/// Adapters receive borrowed `Arc` clones, never ownership; teardown
/// always goes through the manager.
#[async_trait]
pub trait ManagedHandle: Send + Sync + 'static {
    /// Graceful teardown. Handles without close semantics keep the
    /// default.
    async fn close(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    /// Concrete-type escape hatch for adapters.
    fn as_any(&self) -> &(dyn Any + Send + Sync);
}

/// Downcast a shared handle to its concrete adapter type.
pub fn downcast_handle<T: Any + Send + Sync>(handle: &Arc<dyn ManagedHandle>) -> Option<&T> {
    handle.as_any().downcast_ref::<T>()
}
