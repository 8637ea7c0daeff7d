//! Diagnostics surface tests: readiness gate and health report.

use std::sync::Arc;
use std::time::Duration;

use health_supervisor::admin::{self, handlers::AppState};
use health_supervisor::config::{ConnectionConfig, HealthCheckConfig};
use health_supervisor::connection::ConnectionManager;
use health_supervisor::health::{BoundedChecker, ReconnectionQueue};
use health_supervisor::lifecycle::Shutdown;
use health_supervisor::registry::ServiceRegistry;

mod common;
use common::ScriptedProbe;

#[tokio::test]
async fn test_readiness_gate_and_health_report() {
    let config = HealthCheckConfig::default();
    let queue = Arc::new(ReconnectionQueue::new());
    let registry = Arc::new(ServiceRegistry::new(config.backoff_policy(), queue.clone()));
    let checker = BoundedChecker::new(registry.clone());
    let connections = Arc::new(ConnectionManager::new(ConnectionConfig::default()));

    registry.register("db", ScriptedProbe::always_healthy());
    // Fails once, then recovers.
    let cache_probe = ScriptedProbe::new(
        vec![Err(health_supervisor::error::ProbeError::Failed(
            "refused".into(),
        ))],
        Ok(()),
    );
    registry.register("cache", cache_probe);

    checker.check_with_timeout("db", Duration::from_secs(1)).await;
    checker
        .check_with_timeout("cache", Duration::from_secs(1))
        .await;

    let state = AppState {
        registry: registry.clone(),
        checker: checker.clone(),
        connections,
        probe_timeout: Duration::from_secs(1),
    };

    let addr = "127.0.0.1:28187".parse().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = admin::serve(state, addr, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let base = format!("http://{}", addr);

    // One unhealthy dependency gates readiness.
    let res = client.get(format!("{}/ready", base)).send().await.unwrap();
    assert_eq!(res.status(), 503);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ready"], false);
    assert_eq!(body["degraded"], serde_json::json!(["cache"]));

    let res = client
        .get(format!("{}/admin/services", base))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let services: serde_json::Value = res.json().await.unwrap();
    assert_eq!(services.as_array().unwrap().len(), 2);
    assert_eq!(services[0]["name"], "cache");
    assert_eq!(services[0]["status"], "unhealthy");
    assert_eq!(services[0]["consecutive_failures"], 1);

    // The cache probe recovers on its next check.
    checker
        .check_with_timeout("cache", Duration::from_secs(1))
        .await;
    let res = client.get(format!("{}/ready", base)).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .get(format!("{}/admin/status", base))
        .send()
        .await
        .unwrap();
    let status: serde_json::Value = res.json().await.unwrap();
    assert_eq!(status["status"], "operational");

    let res = client
        .get(format!("{}/admin/connections", base))
        .send()
        .await
        .unwrap();
    let rows: serde_json::Value = res.json().await.unwrap();
    assert!(rows.as_array().unwrap().is_empty());

    shutdown.trigger();
}
