// Container handlers: listing, lifecycle actions, logs and stats

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{info, instrument};

use super::{AppState, ForceQuery, parse_or};
use crate::error::ServiceError;
use crate::log_demux;
use crate::models::{ContainerAction, ContainerStats, ContainerSummary};
use crate::runtime_gateway::StatsProbe;
use crate::stats_sampler::compute_stats;

const DEFAULT_LOG_LINES: u32 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct ActionRequest {
    action: String,
}

/// GET /api/v1/containers?all=: all containers unless `all=false`.
pub(super) async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<ContainerSummary>>, ServiceError> {
    let all = params.get("all").map(String::as_str) != Some("false");
    Ok(Json(state.gateway.list_containers(all).await?))
}

pub(super) async fn start_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    perform(&state, &id, ContainerAction::Start, false).await
}

pub(super) async fn stop_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    perform(&state, &id, ContainerAction::Stop, false).await
}

pub(super) async fn restart_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    perform(&state, &id, ContainerAction::Restart, false).await
}

/// DELETE /api/v1/containers/{id}?force=
pub(super) async fn remove_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<ForceQuery>,
) -> Result<Json<Value>, ServiceError> {
    perform(&state, &id, ContainerAction::Remove, q.force()).await
}

/// POST /api/v1/containers/{id}/action: dispatch by action name. Unknown names are
/// rejected before anything is attempted, so they leave no audit record.
pub(super) async fn action_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<ForceQuery>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<Value>, ServiceError> {
    let action: ContainerAction = req.action.parse()?;
    perform(&state, &id, action, q.force()).await
}

/// Run one lifecycle action and write exactly one audit record for it.
#[instrument(skip(state, action), fields(action = action.as_str()))]
async fn perform(
    state: &AppState,
    id: &str,
    action: ContainerAction,
    force: bool,
) -> Result<Json<Value>, ServiceError> {
    // Resolve before acting: a removed container is no longer listed.
    let name = state.gateway.container_name(id).await;
    let result = match action {
        ContainerAction::Start => state.gateway.start_container(id).await,
        ContainerAction::Stop => state.gateway.stop_container(id).await,
        ContainerAction::Restart => state.gateway.restart_container(id).await,
        ContainerAction::Remove => state.gateway.remove_container(id, force).await,
    };
    match result {
        Ok(()) => {
            let details = match action {
                ContainerAction::Remove => {
                    format!("{} (force: {})", action.success_message(), force)
                }
                _ => action.success_message().to_string(),
            };
            state.audit(id, &name, action.as_str(), &details).await;
            info!(container_id = %id, container_name = %name, "container action succeeded");
            Ok(Json(json!({ "message": action.success_message() })))
        }
        Err(e) => {
            state
                .audit(id, &name, &action.failed_tag(), &e.raw_message())
                .await;
            Err(e)
        }
    }
}

/// GET /api/v1/containers/{id}/logs?lines=: formatted `[timestamp] message` lines.
pub(super) async fn logs_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ServiceError> {
    let lines = parse_or(params.get("lines").map(String::as_str), DEFAULT_LOG_LINES);
    let raw = state.gateway.fetch_logs(&id, lines).await?;
    let logs: Vec<String> = log_demux::demux(&raw)
        .iter()
        .map(|entry| entry.display_line())
        .collect();
    Ok(Json(json!({
        "logs": logs,
        "timestamp": chrono::Utc::now().timestamp(),
    })))
}

/// GET /api/v1/containers/{id}/stats: one derived stats sample.
pub(super) async fn stats_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ContainerStats>, ServiceError> {
    let raw = state.gateway.fetch_stats(&id).await?;
    Ok(Json(compute_stats(&id, &raw, chrono::Utc::now())))
}
