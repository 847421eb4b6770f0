// Service error taxonomy and HTTP mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Transport failure, daemon error or timeout talking to the runtime.
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Stats or logs fetch failed for one entity.
    #[error("probe failed for {id}: {reason}")]
    ProbeFailure { id: String, reason: String },
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl ServiceError {
    /// Error text without the category prefix; recorded as audit detail.
    pub fn raw_message(&self) -> String {
        match self {
            ServiceError::RuntimeUnavailable(m)
            | ServiceError::NotFound(m)
            | ServiceError::InvalidRequest(m) => m.clone(),
            ServiceError::ProbeFailure { reason, .. } => reason.clone(),
            ServiceError::Storage(e) => e.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::RuntimeUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::ProbeFailure { .. } => StatusCode::BAD_GATEWAY,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<bollard::errors::Error> for ServiceError {
    fn from(e: bollard::errors::Error) -> Self {
        use bollard::errors::Error as DockerError;
        match e {
            DockerError::DockerResponseServerError {
                status_code: 404,
                message,
            } => ServiceError::NotFound(message),
            DockerError::DockerResponseServerError {
                status_code: 400 | 409,
                message,
            } => ServiceError::InvalidRequest(message),
            other => ServiceError::RuntimeUnavailable(other.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for ServiceError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ServiceError::RuntimeUnavailable("runtime call timed out".into())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(error = %self, status = status.as_u16(), "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
