use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::connection::{ConnectionManager, ConnectionStatus};
use crate::health::BoundedChecker;
use crate::registry::{ServiceHealth, ServiceRegistry, ServiceStatus};

/// Shared state for the diagnostics surface.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub checker: BoundedChecker,
    pub connections: Arc<ConnectionManager>,
    pub probe_timeout: Duration,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ReadyReport {
    pub ready: bool,
    pub degraded: Vec<String>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_services(State(state): State<AppState>) -> Json<Vec<ServiceHealth>> {
    Json(state.registry.cached_snapshot())
}

/// Ad-hoc full sweep: probes every service, then returns the fresh
/// snapshot.
pub async fn refresh_services(State(state): State<AppState>) -> Json<Vec<ServiceHealth>> {
    Json(
        state
            .registry
            .check_all(&state.checker, state.probe_timeout)
            .await,
    )
}

pub async fn get_connections(State(state): State<AppState>) -> Json<Vec<ConnectionStatus>> {
    Json(state.connections.statuses())
}

/// Readiness gate: 503 while any dependency is unhealthy. Serves the
/// cached snapshot; never probes.
pub async fn get_ready(State(state): State<AppState>) -> Response {
    let degraded: Vec<String> = state
        .registry
        .cached_snapshot()
        .into_iter()
        .filter(|service| service.status != ServiceStatus::Healthy)
        .map(|service| service.name)
        .collect();

    if degraded.is_empty() {
        (StatusCode::OK, Json(ReadyReport { ready: true, degraded })).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyReport {
                ready: false,
                degraded,
            }),
        )
            .into_response()
    }
}
