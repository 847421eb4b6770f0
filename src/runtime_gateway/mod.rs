// Docker runtime facade via bollard. Stateless: one runtime round-trip per call.

mod convert;

use crate::config::RuntimeConfig;
use crate::error::ServiceError;
use crate::models::{ContainerSummary, ImageSummary, RawStatsSnapshot, UNKNOWN_CONTAINER_NAME};
use bollard::Docker;
use bollard::query_parameters::{
    CreateImageOptions, ListContainersOptions, ListImagesOptions, LogsOptions,
    PruneImagesOptions, RemoveContainerOptions, RemoveImageOptions, RestartContainerOptions,
    StartContainerOptions, StatsOptions, StopContainerOptions,
};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};

/// Source of raw stats snapshots, one call per probe.
pub trait StatsProbe: Send + Sync {
    fn fetch_stats(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<RawStatsSnapshot, ServiceError>> + Send;
}

/// Cheap to share: the bollard client is a pooled HTTP connection handle.
pub struct RuntimeGateway {
    docker: Docker,
    request_timeout: Duration,
    pull_timeout: Duration,
    stop_grace_secs: u64,
}

impl RuntimeGateway {
    pub fn connect(config: &RuntimeConfig) -> anyhow::Result<Self> {
        let docker = match config.socket_path.as_deref() {
            Some(path) => Docker::connect_with_unix(
                path,
                config.request_timeout_secs,
                bollard::API_DEFAULT_VERSION,
            )?,
            None => Docker::connect_with_local_defaults()?,
        };
        Ok(Self {
            docker,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            pull_timeout: Duration::from_secs(config.pull_timeout_secs),
            stop_grace_secs: config.stop_grace_secs,
        })
    }

    fn grace_secs(&self) -> i32 {
        i32::try_from(self.stop_grace_secs).unwrap_or(i32::MAX)
    }

    /// Stop/restart wait up to the grace period before the daemon kills the container.
    fn stop_timeout(&self) -> Duration {
        self.request_timeout + Duration::from_secs(self.stop_grace_secs)
    }

    #[instrument(skip(self), fields(repo = "runtime", operation = "list_containers"))]
    pub async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, ServiceError> {
        let options = ListContainersOptions {
            all,
            ..Default::default()
        };
        let containers = tokio::time::timeout(
            self.request_timeout,
            self.docker.list_containers(Some(options)),
        )
        .await??;
        Ok(containers
            .into_iter()
            .map(convert::container_summary)
            .collect())
    }

    /// Display name for audit records; `unknown` when the id is not listed or listing fails.
    pub async fn container_name(&self, id: &str) -> String {
        match self.list_containers(true).await {
            Ok(containers) => containers
                .iter()
                .find(|c| c.matches(id))
                .map(|c| c.display_name())
                .unwrap_or_else(|| UNKNOWN_CONTAINER_NAME.to_string()),
            Err(e) => {
                debug!(error = %e, container_id = %id, "name lookup failed");
                UNKNOWN_CONTAINER_NAME.to_string()
            }
        }
    }

    #[instrument(skip(self), fields(repo = "runtime", operation = "start_container"))]
    pub async fn start_container(&self, id: &str) -> Result<(), ServiceError> {
        tokio::time::timeout(
            self.request_timeout,
            self.docker
                .start_container(id, Some(StartContainerOptions::default())),
        )
        .await??;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "runtime", operation = "stop_container"))]
    pub async fn stop_container(&self, id: &str) -> Result<(), ServiceError> {
        let options = StopContainerOptions {
            t: Some(self.grace_secs()),
            ..Default::default()
        };
        tokio::time::timeout(
            self.stop_timeout(),
            self.docker.stop_container(id, Some(options)),
        )
        .await??;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "runtime", operation = "restart_container"))]
    pub async fn restart_container(&self, id: &str) -> Result<(), ServiceError> {
        let options = RestartContainerOptions {
            t: Some(self.grace_secs()),
            ..Default::default()
        };
        tokio::time::timeout(
            self.stop_timeout(),
            self.docker.restart_container(id, Some(options)),
        )
        .await??;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "runtime", operation = "remove_container"))]
    pub async fn remove_container(&self, id: &str, force: bool) -> Result<(), ServiceError> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        tokio::time::timeout(
            self.request_timeout,
            self.docker.remove_container(id, Some(options)),
        )
        .await??;
        Ok(())
    }

    /// Last `tail` lines of stdout+stderr with timestamps, as the runtime's multiplexed byte stream.
    #[instrument(skip(self), fields(repo = "runtime", operation = "fetch_logs"))]
    pub async fn fetch_logs(&self, id: &str, tail: u32) -> Result<Bytes, ServiceError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            timestamps: true,
            tail: tail.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.logs(id, Some(options));
        let collect = async {
            let mut raw = BytesMut::new();
            while let Some(frame) = stream.next().await {
                convert::encode_frame(&mut raw, frame?);
            }
            Ok::<_, bollard::errors::Error>(raw.freeze())
        };
        tokio::time::timeout(self.request_timeout, collect)
            .await
            .map_err(ServiceError::from)
            .and_then(|r| r.map_err(ServiceError::from))
            .map_err(|e| probe_failure(id, e))
    }

    #[instrument(skip(self), fields(repo = "runtime", operation = "list_images"))]
    pub async fn list_images(&self) -> Result<Vec<ImageSummary>, ServiceError> {
        let options = ListImagesOptions {
            all: false,
            ..Default::default()
        };
        let images =
            tokio::time::timeout(self.request_timeout, self.docker.list_images(Some(options)))
                .await??;
        Ok(images.into_iter().map(convert::image_summary).collect())
    }

    /// Pulls one image (":latest" when no tag is given) and waits for the pull to finish.
    #[instrument(skip(self), fields(repo = "runtime", operation = "pull_image"))]
    pub async fn pull_image(&self, reference: &str) -> Result<(), ServiceError> {
        let options = CreateImageOptions {
            from_image: Some(convert::with_default_tag(reference)),
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);
        let drain = async {
            while let Some(progress) = stream.next().await {
                progress?;
            }
            Ok::<_, bollard::errors::Error>(())
        };
        tokio::time::timeout(self.pull_timeout, drain).await??;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "runtime", operation = "remove_image"))]
    pub async fn remove_image(&self, id: &str, force: bool) -> Result<(), ServiceError> {
        let options = RemoveImageOptions {
            force,
            ..Default::default()
        };
        tokio::time::timeout(
            self.request_timeout,
            self.docker.remove_image(id, Some(options), None),
        )
        .await??;
        Ok(())
    }

    /// Removes dangling images; returns reclaimed bytes.
    #[instrument(skip(self), fields(repo = "runtime", operation = "prune_images"))]
    pub async fn prune_images(&self) -> Result<u64, ServiceError> {
        let response = tokio::time::timeout(
            self.request_timeout,
            self.docker.prune_images(Some(PruneImagesOptions::default())),
        )
        .await??;
        Ok(response.space_reclaimed.unwrap_or(0).max(0) as u64)
    }
}

impl StatsProbe for RuntimeGateway {
    /// One non-streaming stats read; the response carries both current and previous counters.
    #[instrument(skip(self), fields(repo = "runtime", operation = "fetch_stats"))]
    async fn fetch_stats(&self, id: &str) -> Result<RawStatsSnapshot, ServiceError> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(id, Some(options));
        let first = tokio::time::timeout(self.request_timeout, stream.next())
            .await
            .map_err(|e| probe_failure(id, e.into()))?;
        match first {
            Some(Ok(response)) => Ok(convert::raw_snapshot(&response)),
            Some(Err(e)) => Err(probe_failure(id, e.into())),
            None => Err(ServiceError::ProbeFailure {
                id: id.to_string(),
                reason: "stats stream ended without a sample".into(),
            }),
        }
    }
}

/// Unknown containers stay NotFound; every other fetch error is a probe failure for `id`.
fn probe_failure(id: &str, e: ServiceError) -> ServiceError {
    match e {
        ServiceError::NotFound(_) | ServiceError::ProbeFailure { .. } => e,
        other => ServiceError::ProbeFailure {
            id: id.to_string(),
            reason: other.raw_message(),
        },
    }
}
