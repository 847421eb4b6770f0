// Integration tests: HTTP endpoints against an unreachable runtime and a temp database

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use dockpanel::audit_repo::AuditRepo;
use dockpanel::config::AppConfig;
use dockpanel::host_repo::HostRepo;
use dockpanel::models::*;
use dockpanel::routes;
use dockpanel::runtime_gateway::RuntimeGateway;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

const TEST_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[database]
path = "data/test.db"
max_pool_size = 2

[runtime]
socket_path = "/nonexistent/dockpanel-test/docker.sock"
request_timeout_secs = 2
stop_grace_secs = 1

[sampling]
enabled = false

[audit]
actor = "test-suite"
"#;

struct Harness {
    server: TestServer,
    audit_repo: Arc<AuditRepo>,
    _dir: TempDir,
}

/// Runtime calls fail with 503 since the socket does not exist. None when the
/// client cannot even be constructed on this platform.
async fn harness() -> Option<Harness> {
    let config = AppConfig::load_from_str(TEST_CONFIG).unwrap();
    let gateway = match RuntimeGateway::connect(&config.runtime) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            eprintln!("skipping: runtime client unavailable: {e}");
            return None;
        }
    };
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.db");
    let audit_repo = Arc::new(
        AuditRepo::connect(path.to_str().unwrap(), 2, 7)
            .await
            .unwrap(),
    );
    audit_repo.init().await.unwrap();
    let app = routes::app(
        gateway,
        audit_repo.clone(),
        Arc::new(HostRepo::new()),
        config,
    );
    Some(Harness {
        server: TestServer::try_new(app).unwrap(),
        audit_repo,
        _dir: dir,
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let Some(h) = harness().await else { return };
    for path in ["/health", "/api/v1/health"] {
        let response = h.server.get(path).await;
        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

#[tokio::test]
async fn test_version_endpoint() {
    let Some(h) = harness().await else { return };
    let response = h.server.get("/version").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(
        json.get("name").and_then(|v| v.as_str()),
        Some("dockpanel")
    );
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_audit_logs_empty() {
    let Some(h) = harness().await else { return };
    let response = h.server.get("/api/v1/logs").await;
    response.assert_status_ok();
    let logs: Vec<AuditLogRecord> = response.json();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn test_audit_logs_limit_and_filter() {
    let Some(h) = harness().await else { return };
    for (id, action) in [("a", "start"), ("b", "stop"), ("a", "restart")] {
        h.audit_repo
            .record_action(id, "svc", action, "test-suite", "ok")
            .await
            .unwrap();
    }

    let logs: Vec<AuditLogRecord> = h.server.get("/api/v1/logs?limit=2").await.json();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action, "restart");

    // unparsable limit falls back to the default
    let logs: Vec<AuditLogRecord> = h.server.get("/api/v1/logs?limit=lots").await.json();
    assert_eq!(logs.len(), 3);

    let logs: Vec<AuditLogRecord> = h.server.get("/api/v1/logs/a").await.json();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|r| r.container_id == "a"));
}

#[tokio::test]
async fn test_failed_start_writes_failed_audit_record() {
    let Some(h) = harness().await else { return };
    let response = h
        .server
        .post("/api/v1/containers/abc123/start")
        .expect_failure()
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert!(body.get("error").and_then(|v| v.as_str()).is_some());

    let logs = h.audit_repo.read_logs(Some("abc123"), 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "start_failed");
    assert_eq!(logs[0].container_name, UNKNOWN_CONTAINER_NAME);
    assert_eq!(logs[0].actor, "test-suite");
    assert!(!logs[0].details.is_empty());
}

#[tokio::test]
async fn test_generic_action_dispatches_and_audits() {
    let Some(h) = harness().await else { return };
    let response = h
        .server
        .post("/api/v1/containers/abc123/action")
        .json(&json!({ "action": "restart" }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let logs = h.audit_repo.read_logs(Some("abc123"), 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "restart_failed");
}

#[tokio::test]
async fn test_unknown_action_is_rejected_without_audit() {
    let Some(h) = harness().await else { return };
    let response = h
        .server
        .post("/api/v1/containers/abc123/action")
        .json(&json!({ "action": "explode" }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.contains("invalid action"))
    );
    assert!(h.audit_repo.read_logs(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_failure_is_audited() {
    let Some(h) = harness().await else { return };
    h.server
        .delete("/api/v1/containers/abc123?force=true")
        .expect_failure()
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let logs = h.audit_repo.read_logs(None, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "remove_failed");
}

#[tokio::test]
async fn test_pull_requires_image_name() {
    let Some(h) = harness().await else { return };
    h.server
        .post("/api/v1/images/pull")
        .json(&json!({ "imageName": "  " }))
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert!(h.audit_repo.read_logs(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_image_actions_use_system_id() {
    let Some(h) = harness().await else { return };
    h.server
        .post("/api/v1/images/pull")
        .json(&json!({ "imageName": "nginx" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    h.server
        .post("/api/v1/images/prune")
        .expect_failure()
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let logs = h
        .audit_repo
        .read_logs(Some(SYSTEM_CONTAINER_ID), 10)
        .await
        .unwrap();
    let actions: Vec<_> = logs.iter().map(|r| r.action.as_str()).collect();
    assert_eq!(actions, vec!["prune_images_failed", "pull_image_failed"]);
    assert_eq!(logs[1].container_name, "nginx");
}

#[tokio::test]
async fn test_runtime_reads_report_unavailable() {
    let Some(h) = harness().await else { return };
    for path in [
        "/api/v1/containers",
        "/api/v1/images",
        "/api/v1/metrics",
        "/api/v1/metrics/abc123",
    ] {
        h.server
            .get(path)
            .expect_failure()
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}

#[tokio::test]
async fn test_historical_metrics_read_stored_samples() {
    let Some(h) = harness().await else { return };
    let response = h.server.get("/api/v1/metrics/historical").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["hours"], 1);
    assert_eq!(body["metrics"], json!([]));

    let metrics = OverallMetrics {
        total_containers: 1,
        running_containers: 1,
        stopped_containers: 0,
        paused_containers: 0,
        system_cpu: 0.0,
        system_memory: 0,
        system_memory_used: 0,
        containers: vec![ContainerMetrics {
            container_id: "web".into(),
            container_name: "web".into(),
            image: "nginx".into(),
            state: ContainerState::Running,
            cpu_usage: 3.0,
            memory_usage: 64,
            memory_limit: 128,
            memory_percent: 50.0,
            network_rx: 1,
            network_tx: 2,
            block_read: 3,
            block_write: 4,
            disk_usage: 7,
            timestamp: Utc::now().timestamp(),
            sampled: true,
        }],
    };
    h.audit_repo.write_samples(&metrics).await.unwrap();

    let body: Value = h
        .server
        .get("/api/v1/metrics/historical?container_id=web&hours=2")
        .await
        .json();
    assert_eq!(body["container_id"], "web");
    assert_eq!(body["hours"], 2);
    let samples: Vec<ContainerMetricSample> =
        serde_json::from_value(body["metrics"].clone()).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].memory_usage, 64);

    let body: Value = h
        .server
        .get("/api/v1/metrics/historical?hours=nope")
        .await
        .json();
    assert_eq!(body["hours"], 1);
    let samples: Vec<SystemMetricSample> =
        serde_json::from_value(body["metrics"].clone()).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].running_containers, 1);
}
