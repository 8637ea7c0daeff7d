//! Diagnostics surface.
//!
//! # Responsibilities
//! - Serve the read-only health report and connection states
//! - Expose the readiness gate consumed by request-path guards
//! - Offer an ad-hoc full sweep for operators
//!
//! # Design Decisions
//! - `/ready` reads the cached snapshot only; it never probes
//! - The refresh sweep is the single deliberately probing endpoint
//! - Plain HTTP on localhost by default; fronting it is the deployment's
//!   concern

pub mod handlers;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use self::handlers::{
    get_connections, get_ready, get_services, get_status, refresh_services, AppState,
};

pub fn admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/services", get(get_services))
        .route("/admin/services/refresh", get(refresh_services))
        .route("/admin/connections", get(get_connections))
        .route("/ready", get(get_ready))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .with_state(state)
}

/// Bind and serve the diagnostics router until the shutdown signal fires.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Diagnostics endpoint listening");

    axum::serve(listener, admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
