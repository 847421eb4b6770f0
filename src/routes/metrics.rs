// Aggregated, per-container and historical metrics

use axum::Json;
use axum::extract::{Path, Query, State};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::warn;

use super::{AppState, parse_or};
use crate::error::ServiceError;
use crate::metrics_aggregator;
use crate::models::{ContainerMetrics, OverallMetrics};

const DEFAULT_HISTORY_HOURS: u32 = 1;

/// GET /api/v1/metrics: counts, host gauge and one record per container.
pub(super) async fn overall_handler(
    State(state): State<AppState>,
) -> Result<Json<OverallMetrics>, ServiceError> {
    let containers = state.gateway.list_containers(true).await?;
    let host = state.host_repo.get_host_gauge().await.unwrap_or_else(|e| {
        warn!(error = %e, operation = "get_host_gauge", "host gauge failed");
        Default::default()
    });
    let metrics = metrics_aggregator::aggregate(
        state.gateway.as_ref(),
        &containers,
        host,
        state.config.runtime.probe_concurrency,
    )
    .await;
    Ok(Json(metrics))
}

/// GET /api/v1/metrics/{id}: 404 when not listed; probe errors surface here.
pub(super) async fn container_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContainerMetrics>, ServiceError> {
    let containers = state.gateway.list_containers(true).await?;
    let container = containers
        .iter()
        .find(|c| c.matches(&id))
        .ok_or_else(|| ServiceError::NotFound(format!("container {}", id)))?;
    if !container.is_running() {
        return Ok(Json(ContainerMetrics::zeroed(container)));
    }
    let metrics = metrics_aggregator::probe_container(state.gateway.as_ref(), container).await?;
    Ok(Json(metrics))
}

/// GET /api/v1/metrics/historical?container_id=&hours=: stored samples, newest first.
/// Without `container_id` the system-wide samples are returned.
pub(super) async fn historical_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ServiceError> {
    let hours = parse_or(params.get("hours").map(String::as_str), DEFAULT_HISTORY_HOURS);
    let container_id = params
        .get("container_id")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    let metrics = match container_id {
        Some(id) => {
            let samples = state.audit_repo.read_container_metrics(id, hours).await?;
            serde_json::to_value(samples).map_err(anyhow::Error::from)?
        }
        None => {
            let samples = state.audit_repo.read_system_metrics(hours).await?;
            serde_json::to_value(samples).map_err(anyhow::Error::from)?
        }
    };
    Ok(Json(json!({
        "container_id": container_id.unwrap_or_default(),
        "hours": hours,
        "metrics": metrics,
    })))
}
