// Audit log reads, newest first

use axum::Json;
use axum::extract::{Path, Query, State};
use std::collections::HashMap;

use super::{AppState, parse_or};
use crate::error::ServiceError;
use crate::models::AuditLogRecord;

const DEFAULT_LIMIT: u32 = 100;

fn limit(params: &HashMap<String, String>) -> u32 {
    parse_or(params.get("limit").map(String::as_str), DEFAULT_LIMIT)
}

/// GET /api/v1/logs?limit=
pub(super) async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<AuditLogRecord>>, ServiceError> {
    let records = state.audit_repo.read_logs(None, limit(&params)).await?;
    Ok(Json(records))
}

/// GET /api/v1/logs/{id}?limit=
pub(super) async fn container_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<AuditLogRecord>>, ServiceError> {
    let records = state
        .audit_repo
        .read_logs(Some(&id), limit(&params))
        .await?;
    Ok(Json(records))
}
