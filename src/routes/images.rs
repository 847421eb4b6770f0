// Image handlers. Audit records use the `system` container id.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AppState, ForceQuery};
use crate::error::ServiceError;
use crate::models::{ImageSummary, SYSTEM_CONTAINER_ID};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PullRequest {
    #[serde(default)]
    image_name: String,
}

pub(super) async fn list_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ImageSummary>>, ServiceError> {
    Ok(Json(state.gateway.list_images().await?))
}

/// POST /api/v1/images/pull: body `{"imageName": "nginx:1.27"}`.
pub(super) async fn pull_handler(
    State(state): State<AppState>,
    Json(req): Json<PullRequest>,
) -> Result<Json<Value>, ServiceError> {
    let reference = req.image_name.trim();
    if reference.is_empty() {
        return Err(ServiceError::InvalidRequest("imageName is required".into()));
    }
    match state.gateway.pull_image(reference).await {
        Ok(()) => {
            state
                .audit(
                    SYSTEM_CONTAINER_ID,
                    reference,
                    "pull_image",
                    &format!("Image {} pulled successfully", reference),
                )
                .await;
            Ok(Json(json!({ "message": "Image pulled successfully" })))
        }
        Err(e) => {
            state
                .audit(SYSTEM_CONTAINER_ID, reference, "pull_image_failed", &e.raw_message())
                .await;
            Err(e)
        }
    }
}

/// DELETE /api/v1/images/{id}?force=
pub(super) async fn remove_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<ForceQuery>,
) -> Result<Json<Value>, ServiceError> {
    let force = q.force();
    match state.gateway.remove_image(&id, force).await {
        Ok(()) => {
            state
                .audit(
                    SYSTEM_CONTAINER_ID,
                    &id,
                    "remove_image",
                    &format!("Image removed successfully (force: {})", force),
                )
                .await;
            Ok(Json(json!({ "message": "Image removed successfully" })))
        }
        Err(e) => {
            state
                .audit(SYSTEM_CONTAINER_ID, &id, "remove_image_failed", &e.raw_message())
                .await;
            Err(e)
        }
    }
}

/// POST /api/v1/images/prune: removes dangling images, reports bytes reclaimed.
pub(super) async fn prune_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, ServiceError> {
    match state.gateway.prune_images().await {
        Ok(reclaimed) => {
            state
                .audit(
                    SYSTEM_CONTAINER_ID,
                    "images",
                    "prune_images",
                    &format!("Images pruned, {} bytes reclaimed", reclaimed),
                )
                .await;
            Ok(Json(json!({
                "message": "Images pruned successfully",
                "spaceReclaimed": reclaimed,
            })))
        }
        Err(e) => {
            state
                .audit(SYSTEM_CONTAINER_ID, "images", "prune_images_failed", &e.raw_message())
                .await;
            Err(e)
        }
    }
}
