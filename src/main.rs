//! Service health supervisor daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌────────────────────────────────────────────────┐
//!                  │                HEALTH SUPERVISOR                │
//!                  │                                                 │
//!   config file ───┼─▶ config ──▶ registry ◀── probes (tcp/http)    │
//!                  │                 │                               │
//!                  │                 ▼                               │
//!                  │          startup barrier (wait_all)             │
//!                  │                 │                               │
//!                  │                 ▼                               │
//!                  │   health monitor loop ──▶ bounded checker       │
//!                  │   (queue drain, circuit breaker, rescan)        │
//!                  │                                                 │
//!   GET /ready ────┼─▶ admin ──▶ cached snapshot (never probes)     │
//!   GET /admin/* ──┼─▶ admin ──▶ health report / connection states  │
//!                  │                                                 │
//!                  │   adapters ──▶ connection manager (coalesced)  │
//!                  └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use health_supervisor::admin::{self, handlers::AppState};
use health_supervisor::config::{load_config, MonitorConfig, ServiceKind};
use health_supervisor::connection::ConnectionManager;
use health_supervisor::health::{BoundedChecker, HealthMonitor, ReconnectionQueue};
use health_supervisor::lifecycle::Shutdown;
use health_supervisor::probes::{HealthProbe, HttpProbe, TcpProbe};
use health_supervisor::registry::{ServiceRegistry, ServiceStatus};

#[derive(Parser)]
#[command(name = "health-supervisor")]
#[command(about = "Dependency health supervision daemon", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "health_supervisor=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("health-supervisor v{} starting", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            tracing::info!("No config file given, using defaults");
            MonitorConfig::default()
        }
    };

    tracing::info!(
        services = config.services.len(),
        probe_timeout_ms = config.health_check.probe_timeout_ms,
        circuit_breaker_threshold = config.health_check.circuit_breaker_threshold,
        "Configuration loaded"
    );

    let queue = Arc::new(ReconnectionQueue::new());
    let registry = Arc::new(ServiceRegistry::new(
        config.health_check.backoff_policy(),
        queue.clone(),
    ));
    let checker = BoundedChecker::new(registry.clone());
    let connections = Arc::new(ConnectionManager::new(config.connection.clone()));

    for service in &config.services {
        let probe: Arc<dyn HealthProbe> = match service.kind {
            ServiceKind::Tcp => Arc::new(TcpProbe::new(service.target.parse()?)),
            ServiceKind::Http => Arc::new(HttpProbe::new(service.target.parse()?)),
        };
        registry.register(service.name.clone(), probe);
    }

    let probe_timeout = Duration::from_millis(config.health_check.probe_timeout_ms);

    // Startup barrier: every service gets its attempts before traffic is
    // admitted. Non-converging services stay unhealthy; the readiness
    // guard gates them downstream.
    registry.wait_all(&checker, &config.startup, probe_timeout).await;

    let shutdown = Shutdown::new();

    let monitor = HealthMonitor::new(
        registry.clone(),
        checker.clone(),
        queue.clone(),
        config.health_check.clone(),
    );
    let scheduler = monitor.scheduler();
    for service in registry.cached_snapshot() {
        if service.status != ServiceStatus::Healthy {
            scheduler.schedule_reconnection(&service.name);
        }
    }
    tokio::spawn(monitor.run(shutdown.subscribe()));

    if config.admin.enabled {
        let state = AppState {
            registry: registry.clone(),
            checker: checker.clone(),
            connections: connections.clone(),
            probe_timeout,
        };
        let addr = config.admin.bind_address.parse()?;
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(state, addr, rx).await {
                tracing::error!(error = %e, "Diagnostics endpoint failed");
            }
        });
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
    connections.cleanup().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
