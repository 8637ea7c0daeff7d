//! Connection cache with per-name request coalescing.
//!
//! # Responsibilities
//! - One live handle per name; concurrent requests share a single attempt
//! - Retry with a per-try timeout and linear backoff on creation
//! - Validation, forced disconnect, and errored-entry cleanup
//!
//! # Design Decisions
//! - The shared pending future is the mutual-exclusion primitive: no
//!   global lock, coalescing is scoped per name
//! - A waiter that observes the shared attempt fail starts (or joins) one
//!   fresh attempt before giving up, so a stale failure is not propagated
//!   to every waiter indefinitely
//! - The handle is purged before graceful close is attempted; a dangling
//!   handle is never observable as `Connected`

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use serde::Serialize;
use tokio::time;

use crate::config::ConnectionConfig;
use crate::error::{ConnectError, ValidationFailure};
use crate::observability::metrics;

use super::handle::ManagedHandle;

/// Boxed factory error; adapters surface whatever their client library
/// produces.
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

type AttemptFuture = Shared<BoxFuture<'static, Result<Arc<dyn ManagedHandle>, ConnectError>>>;

/// An in-flight creation attempt. The epoch identifies it so a completed
/// attempt only commits its outcome if nothing superseded it meanwhile.
#[derive(Clone)]
struct PendingAttempt {
    epoch: u64,
    future: AttemptFuture,
}

/// Lifecycle state of a named connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

#[derive(Default)]
struct ConnectionEntry {
    state: ConnectionState,
    handle: Option<Arc<dyn ManagedHandle>>,
    /// Present only while `state == Connecting`.
    pending: Option<PendingAttempt>,
}

/// Per-name connection status row for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub name: String,
    pub state: ConnectionState,
}

/// Singleton-per-name connection cache.
pub struct ConnectionManager {
    entries: DashMap<String, ConnectionEntry>,
    config: ConnectionConfig,
    next_epoch: AtomicU64,
}

enum Plan {
    Ready(Arc<dyn ManagedHandle>),
    Join(PendingAttempt),
    Run(PendingAttempt),
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            next_epoch: AtomicU64::new(1),
        }
    }

    /// Return the live handle for `name`, creating it with `factory` if
    /// needed. `None` means "temporarily unavailable"; callers retry
    /// later.
    pub async fn get_connection<F, Fut>(
        &self,
        name: &str,
        factory: F,
    ) -> Option<Arc<dyn ManagedHandle>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn ManagedHandle>, FactoryError>> + Send + 'static,
    {
        self.get_connection_with(name, factory, self.config.clone())
            .await
    }

    /// [`get_connection`](Self::get_connection) with per-call creation
    /// settings, for resources whose timeout or retry budget differs from
    /// the manager default.
    pub async fn get_connection_with<F, Fut>(
        &self,
        name: &str,
        factory: F,
        config: ConnectionConfig,
    ) -> Option<Arc<dyn ManagedHandle>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn ManagedHandle>, FactoryError>> + Send + 'static,
    {
        let factory = Arc::new(factory);
        let mut retried_stale = false;

        loop {
            let plan = {
                let mut entry = self.entries.entry(name.to_string()).or_default();
                match entry.state {
                    ConnectionState::Connected => match entry.handle.clone() {
                        Some(handle) => Plan::Ready(handle),
                        None => Plan::Run(self.start_attempt(
                            entry.value_mut(),
                            name,
                            factory.clone(),
                            config.clone(),
                        )),
                    },
                    ConnectionState::Connecting => match entry.pending.clone() {
                        Some(attempt) => Plan::Join(attempt),
                        None => Plan::Run(self.start_attempt(
                            entry.value_mut(),
                            name,
                            factory.clone(),
                            config.clone(),
                        )),
                    },
                    ConnectionState::Disconnected | ConnectionState::Error => {
                        Plan::Run(self.start_attempt(
                            entry.value_mut(),
                            name,
                            factory.clone(),
                            config.clone(),
                        ))
                    }
                }
            };

            match plan {
                Plan::Ready(handle) => return Some(handle),
                Plan::Run(attempt) => {
                    let result = attempt.future.clone().await;
                    return self.settle(name, attempt.epoch, result);
                }
                Plan::Join(attempt) => match attempt.future.clone().await {
                    Ok(handle) => {
                        self.settle(name, attempt.epoch, Ok(handle.clone()));
                        return Some(handle);
                    }
                    Err(e) => {
                        self.settle(name, attempt.epoch, Err(e));
                        if retried_stale {
                            return None;
                        }
                        // The attempt we joined failed; go around once and
                        // start (or join) a fresh one.
                        retried_stale = true;
                    }
                },
            }
        }
    }

    /// Install a new pending attempt on the entry. Caller holds the entry
    /// lock.
    fn start_attempt<F, Fut>(
        &self,
        entry: &mut ConnectionEntry,
        name: &str,
        factory: Arc<F>,
        config: ConnectionConfig,
    ) -> PendingAttempt
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn ManagedHandle>, FactoryError>> + Send + 'static,
    {
        let attempt = PendingAttempt {
            epoch: self.next_epoch.fetch_add(1, Ordering::Relaxed),
            future: Self::create_connection(name.to_string(), factory, config)
                .boxed()
                .shared(),
        };
        entry.state = ConnectionState::Connecting;
        entry.handle = None;
        entry.pending = Some(attempt.clone());
        attempt
    }

    /// Up to `max_retries` sequential tries, each racing the factory
    /// against the per-attempt timeout, with linear backoff between tries.
    async fn create_connection<F, Fut>(
        name: String,
        factory: Arc<F>,
        config: ConnectionConfig,
    ) -> Result<Arc<dyn ManagedHandle>, ConnectError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn ManagedHandle>, FactoryError>> + Send + 'static,
    {
        let max_retries = config.max_retries.max(1);
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let mut last = ConnectError::Factory("no attempts made".into());

        for attempt in 1..=max_retries {
            match time::timeout(timeout, factory()).await {
                Ok(Ok(handle)) => {
                    if attempt > 1 {
                        tracing::info!(connection = %name, attempt, "Connected after retry");
                    }
                    return Ok(handle);
                }
                Ok(Err(e)) => {
                    tracing::warn!(connection = %name, attempt, error = %e, "Connection factory failed");
                    last = ConnectError::Factory(e.to_string());
                }
                Err(_) => {
                    tracing::warn!(
                        connection = %name,
                        attempt,
                        timeout_ms = config.connect_timeout_ms,
                        "Connection attempt timed out"
                    );
                    last = ConnectError::Timeout;
                }
            }

            if attempt < max_retries {
                time::sleep(Duration::from_millis(
                    config.retry_delay_ms.saturating_mul(attempt as u64),
                ))
                .await;
            }
        }

        Err(ConnectError::Exhausted {
            attempts: max_retries,
            last: last.to_string(),
        })
    }

    /// Commit an attempt's outcome. Idempotent: only the entry's current
    /// pending attempt may transition it, so late waiters of a superseded
    /// attempt change nothing.
    fn settle(
        &self,
        name: &str,
        epoch: u64,
        result: Result<Arc<dyn ManagedHandle>, ConnectError>,
    ) -> Option<Arc<dyn ManagedHandle>> {
        let mut entry = self.entries.entry(name.to_string()).or_default();
        let current = entry
            .pending
            .as_ref()
            .map(|pending| pending.epoch == epoch)
            .unwrap_or(false);

        match result {
            Ok(handle) => {
                if current {
                    entry.pending = None;
                    entry.state = ConnectionState::Connected;
                    entry.handle = Some(handle.clone());
                    tracing::info!(connection = %name, "Connection established");
                    metrics::record_connection_transition(name, "connected");
                }
                Some(handle)
            }
            Err(e) => {
                if current {
                    entry.pending = None;
                    entry.state = ConnectionState::Error;
                    entry.handle = None;
                    tracing::warn!(connection = %name, error = %e, "Connection failed");
                    metrics::record_connection_transition(name, "error");
                }
                None
            }
        }
    }

    /// Run a caller-supplied liveness check against the cached handle.
    /// Returns `false` (and evicts the handle) on failure; `false` without
    /// invoking the validator when nothing is connected.
    pub async fn validate_connection<F, Fut>(&self, name: &str, validator: F) -> bool
    where
        F: FnOnce(Arc<dyn ManagedHandle>) -> Fut,
        Fut: Future<Output = Result<(), FactoryError>>,
    {
        let handle = match self.entries.get(name) {
            Some(entry) if entry.state == ConnectionState::Connected => entry.handle.clone(),
            _ => None,
        };
        let Some(handle) = handle else {
            return false;
        };

        match validator(handle).await {
            Ok(()) => true,
            Err(e) => {
                let failure = ValidationFailure(e.to_string());
                tracing::warn!(connection = %name, error = %failure, "Evicting connection");
                if let Some(mut entry) = self.entries.get_mut(name) {
                    // Only evict if nothing replaced the handle meanwhile.
                    if entry.state == ConnectionState::Connected {
                        entry.handle = None;
                        entry.state = ConnectionState::Error;
                        metrics::record_connection_transition(name, "error");
                    }
                }
                false
            }
        }
    }

    /// Force the entry to `Disconnected` and release the handle. The purge
    /// happens first; graceful close is best-effort.
    pub async fn disconnect(&self, name: &str) {
        let handle = match self.entries.get_mut(name) {
            Some(mut entry) => {
                entry.pending = None;
                entry.state = ConnectionState::Disconnected;
                entry.handle.take()
            }
            None => None,
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.close().await {
                tracing::warn!(connection = %name, error = %e, "Graceful close failed, handle dropped anyway");
            }
        }
        tracing::info!(connection = %name, "Disconnected");
        metrics::record_connection_transition(name, "disconnected");
    }

    /// Disconnect every entry currently in `Error` state, concurrently and
    /// best-effort.
    pub async fn cleanup(&self) {
        let names: Vec<String> = self
            .entries
            .iter()
            .filter(|item| item.value().state == ConnectionState::Error)
            .map(|item| item.key().clone())
            .collect();
        if names.is_empty() {
            return;
        }

        tracing::info!(count = names.len(), "Cleaning up errored connections");
        futures_util::future::join_all(names.iter().map(|name| self.disconnect(name))).await;
    }

    pub fn state_of(&self, name: &str) -> Option<ConnectionState> {
        self.entries.get(name).map(|entry| entry.state)
    }

    /// Status rows for the diagnostics report.
    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        let mut rows: Vec<ConnectionStatus> = self
            .entries
            .iter()
            .map(|item| ConnectionStatus {
                name: item.key().clone(),
                state: item.value().state,
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }
}
