//! Shared utilities for integration testing.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use health_supervisor::connection::ManagedHandle;
use health_supervisor::error::ProbeError;
use health_supervisor::probes::HealthProbe;

/// Probe driven by a scripted outcome sequence; once the script runs out
/// it keeps answering with the default outcome.
pub struct ScriptedProbe {
    script: Mutex<VecDeque<Result<(), ProbeError>>>,
    default: Result<(), ProbeError>,
    calls: AtomicU32,
}

#[allow(dead_code)]
impl ScriptedProbe {
    pub fn new(
        script: Vec<Result<(), ProbeError>>,
        default: Result<(), ProbeError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            default,
            calls: AtomicU32::new(0),
        })
    }

    pub fn always_healthy() -> Arc<Self> {
        Self::new(Vec::new(), Ok(()))
    }

    pub fn always_failing() -> Arc<Self> {
        Self::new(
            Vec::new(),
            Err(ProbeError::Failed("connection refused".into())),
        )
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.default.clone())
    }
}

/// Probe that hangs for a fixed duration before answering healthy.
#[allow(dead_code)]
pub struct SlowProbe {
    pub delay: Duration,
}

#[async_trait]
impl HealthProbe for SlowProbe {
    async fn probe(&self) -> Result<(), ProbeError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Connection handle whose close can be scripted to fail.
pub struct TestHandle {
    pub id: u32,
    fail_close: bool,
    closed: AtomicU32,
}

#[allow(dead_code)]
impl TestHandle {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            fail_close: false,
            closed: AtomicU32::new(0),
        }
    }

    pub fn with_failing_close(id: u32) -> Self {
        Self {
            id,
            fail_close: true,
            closed: AtomicU32::new(0),
        }
    }

    pub fn close_calls(&self) -> u32 {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManagedHandle for TestHandle {
    async fn close(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            Err("close refused".into())
        } else {
            Ok(())
        }
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
