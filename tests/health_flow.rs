//! Health monitoring flow tests: startup barrier, bounded checks,
//! background reconnection and circuit breaking.

use std::sync::Arc;
use std::time::{Duration, Instant};

use health_supervisor::config::{HealthCheckConfig, StartupConfig};
use health_supervisor::error::ProbeError;
use health_supervisor::health::{BoundedChecker, HealthMonitor, ReconnectionQueue};
use health_supervisor::lifecycle::Shutdown;
use health_supervisor::registry::{ServiceRegistry, ServiceStatus};

mod common;
use common::{ScriptedProbe, SlowProbe};

fn quick_health_config() -> HealthCheckConfig {
    HealthCheckConfig {
        probe_timeout_ms: 200,
        initial_delay_ms: 10,
        max_delay_ms: 100,
        backoff_multiplier: 2.0,
        circuit_breaker_threshold: 5,
        circuit_max_open_secs: 300,
        batch_size: 4,
        busy_interval_ms: 10,
        idle_interval_ms: 20,
        rescan_probability: 0.0,
    }
}

fn build(
    config: &HealthCheckConfig,
) -> (Arc<ServiceRegistry>, Arc<ReconnectionQueue>, BoundedChecker) {
    let queue = Arc::new(ReconnectionQueue::new());
    let registry = Arc::new(ServiceRegistry::new(config.backoff_policy(), queue.clone()));
    let checker = BoundedChecker::new(registry.clone());
    (registry, queue, checker)
}

#[tokio::test]
async fn test_wait_all_records_mixed_outcomes() {
    let config = quick_health_config();
    let (registry, _queue, checker) = build(&config);

    registry.register("db", ScriptedProbe::always_healthy());
    registry.register("cache", ScriptedProbe::always_failing());

    let startup = StartupConfig {
        max_attempts: 3,
        initial_delay_ms: 10,
        max_delay_ms: 50,
        backoff_multiplier: 2.0,
    };

    // Returns after exhausting both services; never errors.
    registry
        .wait_all(&checker, &startup, Duration::from_millis(200))
        .await;

    let snapshot = registry.cached_snapshot();
    let db = snapshot.iter().find(|s| s.name == "db").unwrap();
    let cache = snapshot.iter().find(|s| s.name == "cache").unwrap();

    assert_eq!(db.status, ServiceStatus::Healthy);
    assert_eq!(db.consecutive_failures, 0);
    assert_eq!(cache.status, ServiceStatus::Unhealthy);
    assert_eq!(cache.consecutive_failures, 3);
    assert!(cache.last_error.as_deref().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_snapshot_never_blocks_on_inflight_probe() {
    let config = quick_health_config();
    let (registry, _queue, checker) = build(&config);

    registry.register(
        "slow",
        Arc::new(SlowProbe {
            delay: Duration::from_secs(5),
        }),
    );

    let bg = {
        let checker = checker.clone();
        tokio::spawn(async move {
            checker
                .check_with_timeout("slow", Duration::from_millis(150))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Probe still in flight; the snapshot must come back immediately.
    let started = Instant::now();
    let snapshot = registry.cached_snapshot();
    assert!(started.elapsed() < Duration::from_millis(50));
    assert_eq!(snapshot.len(), 1);

    // The bounded check converts the overrun into a timeout failure.
    assert_eq!(bg.await.unwrap(), Some(ServiceStatus::Unhealthy));
    let row = &registry.cached_snapshot()[0];
    assert_eq!(row.consecutive_failures, 1);
    assert_eq!(row.last_error.as_deref(), Some("probe timed out"));
}

#[tokio::test]
async fn test_scheduler_enqueue_is_idempotent() {
    let config = quick_health_config();
    let (registry, queue, checker) = build(&config);

    registry.register("db", ScriptedProbe::always_failing());
    checker
        .check_with_timeout("db", Duration::from_millis(200))
        .await;

    let monitor = HealthMonitor::new(
        registry.clone(),
        checker.clone(),
        queue.clone(),
        config.clone(),
    );
    let scheduler = monitor.scheduler();

    scheduler.schedule_reconnection("db");
    scheduler.schedule_reconnection("db");
    assert_eq!(queue.queued_len(), 1);

    // Unregistered names are ignored.
    scheduler.schedule_reconnection("ghost");
    assert_eq!(queue.queued_len(), 1);
}

#[tokio::test]
async fn test_monitor_recovers_failed_service() {
    let config = quick_health_config();
    let (registry, queue, checker) = build(&config);

    // Fails once, then recovers.
    let probe = ScriptedProbe::new(vec![Err(ProbeError::Failed("down".into()))], Ok(()));
    registry.register("db", probe);

    checker
        .check_with_timeout("db", Duration::from_millis(200))
        .await;
    assert!(!registry.all_healthy());

    let shutdown = Shutdown::new();
    let monitor = HealthMonitor::new(
        registry.clone(),
        checker.clone(),
        queue.clone(),
        config.clone(),
    );
    let scheduler = monitor.scheduler();
    tokio::spawn(monitor.run(shutdown.subscribe()));

    scheduler.schedule_reconnection("db");

    // One failure means a ~1s throttle before the retry runs.
    let deadline = Instant::now() + Duration::from_secs(3);
    while !registry.all_healthy() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    shutdown.trigger();

    assert!(registry.all_healthy());
    let row = &registry.cached_snapshot()[0];
    assert_eq!(row.consecutive_failures, 0);
    assert!(row.last_error.is_none());
}

#[tokio::test]
async fn test_circuit_breaker_skips_probe_after_threshold() {
    let config = quick_health_config();
    let (registry, queue, checker) = build(&config);

    let probe = ScriptedProbe::always_failing();
    registry.register("db", probe.clone());

    // Six consecutive failures, each under the probe bound.
    for _ in 0..6 {
        checker
            .check_with_timeout("db", Duration::from_millis(200))
            .await;
    }
    assert_eq!(probe.calls(), 6);

    let shutdown = Shutdown::new();
    let monitor = HealthMonitor::new(
        registry.clone(),
        checker.clone(),
        queue.clone(),
        config.clone(),
    );
    tokio::spawn(monitor.run(shutdown.subscribe()));

    // Hand the name to the loop directly; it must open the circuit instead
    // of probing a seventh time.
    queue.try_enqueue("db", Duration::ZERO);
    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown.trigger();

    assert_eq!(probe.calls(), 6);
    assert!(!queue.is_pending("db"));

    // Eligibility was pushed out to the circuit cool-down, far past the
    // normal backoff cap.
    let row = &registry.cached_snapshot()[0];
    assert!(row.next_check_in_ms > 25_000);
}

#[tokio::test]
async fn test_remove_purges_pending_work() {
    let config = quick_health_config();
    let (registry, queue, _checker) = build(&config);

    registry.register("db", ScriptedProbe::always_failing());
    queue.try_enqueue("db", Duration::ZERO);

    registry.remove("db");
    assert!(!queue.is_pending("db"));
    assert!(registry.cached_snapshot().is_empty());

    // Removing an absent name is a no-op.
    registry.remove("db");
}

#[tokio::test]
async fn test_check_all_returns_fresh_snapshot() {
    let config = quick_health_config();
    let (registry, _queue, checker) = build(&config);

    registry.register("db", ScriptedProbe::always_healthy());
    registry.register("cache", ScriptedProbe::always_failing());

    let snapshot = registry
        .check_all(&checker, Duration::from_millis(200))
        .await;

    let db = snapshot.iter().find(|s| s.name == "db").unwrap();
    let cache = snapshot.iter().find(|s| s.name == "cache").unwrap();
    assert_eq!(db.status, ServiceStatus::Healthy);
    assert_eq!(cache.status, ServiceStatus::Unhealthy);
    assert_eq!(cache.consecutive_failures, 1);
    assert!(db.last_checked_at.is_some());
}
