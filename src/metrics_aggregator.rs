// Fan out stats probes over the container listing and fold them into OverallMetrics.
// A failed probe degrades that container to a zeroed record; it never fails the aggregate.

use chrono::Utc;
use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::models::{ContainerMetrics, ContainerState, ContainerSummary, HostGauge, OverallMetrics};
use crate::runtime_gateway::StatsProbe;
use crate::stats_sampler::compute_stats;

pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub total: u32,
    pub running: u32,
    pub stopped: u32,
    pub paused: u32,
}

/// Counts by lifecycle state. `stopped` is exited containers only; created/dead count toward total.
pub fn count_states(containers: &[ContainerSummary]) -> StateCounts {
    containers
        .iter()
        .fold(StateCounts::default(), |mut acc, c| {
            acc.total += 1;
            match c.state {
                ContainerState::Running => acc.running += 1,
                ContainerState::Exited => acc.stopped += 1,
                ContainerState::Paused => acc.paused += 1,
                _ => {}
            }
            acc
        })
}

/// Aggregate metrics for `containers`, probing running ones with at most `concurrency`
/// probes in flight. Output order matches input order.
pub async fn aggregate<P: StatsProbe>(
    probe: &P,
    containers: &[ContainerSummary],
    host: HostGauge,
    concurrency: usize,
) -> OverallMetrics {
    let counts = count_states(containers);
    // Collected up front so the aggregate future stays Send when spawned.
    let probes: Vec<_> = containers
        .iter()
        .map(|c| container_metrics(probe, c))
        .collect();
    let metrics: Vec<ContainerMetrics> = stream::iter(probes)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    debug!(
        total = counts.total,
        running = counts.running,
        zeroed = metrics.iter().filter(|m| m.is_zeroed()).count(),
        "metrics aggregated"
    );

    OverallMetrics {
        total_containers: counts.total,
        running_containers: counts.running,
        stopped_containers: counts.stopped,
        paused_containers: counts.paused,
        system_cpu: host.cpu_percent,
        system_memory: host.memory_total,
        system_memory_used: host.memory_used,
        containers: metrics,
    }
}

/// Metrics for one container during aggregation: zeroed when not running or when the probe fails.
pub async fn container_metrics<P: StatsProbe>(
    probe: &P,
    container: &ContainerSummary,
) -> ContainerMetrics {
    if !container.is_running() {
        return ContainerMetrics::zeroed(container);
    }
    match probe_container(probe, container).await {
        Ok(m) => m,
        Err(e) => {
            warn!(
                error = %e,
                container_id = %container.id,
                operation = "fetch_stats",
                "stats probe failed; reporting zeroed metrics"
            );
            ContainerMetrics::zeroed(container)
        }
    }
}

/// Strict single-container probe: the error is returned to the caller.
pub async fn probe_container<P: StatsProbe>(
    probe: &P,
    container: &ContainerSummary,
) -> Result<ContainerMetrics, ServiceError> {
    let raw = probe.fetch_stats(&container.id).await?;
    let stats = compute_stats(&container.id, &raw, Utc::now());
    Ok(ContainerMetrics::from_stats(container, &stats))
}
