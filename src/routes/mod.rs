// HTTP routes: containers, images, audit logs, metrics

mod audit;
mod containers;
mod http;
mod images;
mod metrics;

use axum::http::Method;
use axum::{
    Router,
    routing::{delete, get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::audit_repo::AuditRepo;
use crate::config::AppConfig;
use crate::host_repo::HostRepo;
use crate::runtime_gateway::RuntimeGateway;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) gateway: Arc<RuntimeGateway>,
    pub(crate) audit_repo: Arc<AuditRepo>,
    pub(crate) host_repo: Arc<HostRepo>,
    pub(crate) config: AppConfig,
}

impl AppState {
    /// Best-effort audit write: a storage failure is logged, never surfaced to the caller.
    pub(crate) async fn audit(
        &self,
        container_id: &str,
        container_name: &str,
        action: &str,
        details: &str,
    ) {
        if let Err(e) = self
            .audit_repo
            .record_action(
                container_id,
                container_name,
                action,
                &self.config.audit.actor,
                details,
            )
            .await
        {
            warn!(
                error = %e,
                container_id,
                action,
                operation = "record_action",
                "audit write failed"
            );
        }
    }
}

pub fn app(
    gateway: Arc<RuntimeGateway>,
    audit_repo: Arc<AuditRepo>,
    host_repo: Arc<HostRepo>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        gateway,
        audit_repo,
        host_repo,
        config,
    };

    let api = Router::new()
        .route("/health", get(http::health_handler))
        .route("/version", get(http::version_handler))
        .route("/containers", get(containers::list_handler))
        .route("/containers/{id}", delete(containers::remove_handler))
        .route("/containers/{id}/start", post(containers::start_handler))
        .route("/containers/{id}/stop", post(containers::stop_handler))
        .route("/containers/{id}/restart", post(containers::restart_handler))
        .route("/containers/{id}/action", post(containers::action_handler))
        .route("/containers/{id}/logs", get(containers::logs_handler))
        .route("/containers/{id}/stats", get(containers::stats_handler))
        .route("/images", get(images::list_handler))
        .route("/images/pull", post(images::pull_handler))
        .route("/images/prune", post(images::prune_handler))
        .route("/images/{id}", delete(images::remove_handler))
        .route("/logs", get(audit::list_handler))
        .route("/logs/{id}", get(audit::container_handler))
        .route("/metrics", get(metrics::overall_handler))
        .route("/metrics/historical", get(metrics::historical_handler))
        .route("/metrics/{id}", get(metrics::container_handler));

    Router::new()
        .route("/health", get(http::health_handler)) // GET /health
        .route("/version", get(http::version_handler)) // GET /version
        .nest("/api/v1", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Lenient numeric query value: missing or unparsable falls back to `default`.
pub(crate) fn parse_or<T: std::str::FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

/// `?force=true` toggles forced removal; anything else is false.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ForceQuery {
    force: Option<String>,
}

impl ForceQuery {
    pub(crate) fn force(&self) -> bool {
        self.force.as_deref() == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or::<u32>(Some("25"), 100), 25);
        assert_eq!(parse_or::<u32>(Some("abc"), 100), 100);
        assert_eq!(parse_or::<u32>(Some("-3"), 100), 100);
        assert_eq!(parse_or::<u32>(None, 100), 100);
    }

    #[test]
    fn force_is_literal_true_only() {
        let q = ForceQuery {
            force: Some("true".into()),
        };
        assert!(q.force());
        let q = ForceQuery {
            force: Some("1".into()),
        };
        assert!(!q.force());
        assert!(!ForceQuery::default().force());
    }
}
