// Optional RuntimeGateway tests when a Docker daemon is available

use dockpanel::config::RuntimeConfig;
use dockpanel::error::ServiceError;
use dockpanel::log_demux;
use dockpanel::models::UNKNOWN_CONTAINER_NAME;
use dockpanel::runtime_gateway::{RuntimeGateway, StatsProbe};
use dockpanel::stats_sampler::compute_stats;

const MISSING_ID: &str = "dockpanel-test-no-such-container";

/// None when Docker is not available (e.g. CI without Docker).
async fn live_gateway() -> Option<RuntimeGateway> {
    let gateway = RuntimeGateway::connect(&RuntimeConfig::default()).ok()?;
    gateway.list_containers(true).await.ok()?;
    Some(gateway)
}

#[tokio::test]
async fn gateway_lists_containers_and_images() {
    let Some(gateway) = live_gateway().await else { return };
    let all = gateway.list_containers(true).await.unwrap();
    let running = gateway.list_containers(false).await.unwrap();
    assert!(running.len() <= all.len());
    assert!(running.iter().all(|c| c.is_running()));

    let images = gateway.list_images().await.unwrap();
    assert!(images.iter().all(|i| !i.repo_tags.is_empty()));
}

#[tokio::test]
async fn gateway_unknown_container_maps_to_not_found() {
    let Some(gateway) = live_gateway().await else { return };
    let err = gateway.start_container(MISSING_ID).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
    let err = gateway.remove_container(MISSING_ID, true).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
    assert_eq!(gateway.container_name(MISSING_ID).await, UNKNOWN_CONTAINER_NAME);
}

#[tokio::test]
async fn gateway_stats_and_logs_for_running_container() {
    let Some(gateway) = live_gateway().await else { return };
    let running = gateway.list_containers(false).await.unwrap();
    let Some(container) = running.first() else { return };

    let raw = gateway.fetch_stats(&container.id).await.unwrap();
    assert!(raw.online_cpus >= 1);
    let stats = compute_stats(&container.id, &raw, chrono::Utc::now());
    assert!(stats.cpu_percent >= 0.0);
    assert!(stats.memory.percent >= 0.0);

    let bytes = gateway.fetch_logs(&container.id, 10).await.unwrap();
    let entries = log_demux::demux(&bytes);
    assert!(entries.iter().all(|e| !e.message.trim().is_empty()));

    assert_eq!(
        gateway.container_name(&container.id).await,
        container.display_name()
    );
}
