// Background sampler: aggregate metrics on an interval and persist them as samples.
// Also prunes expired samples and runs VACUUM on a schedule (cron or after each prune).

use crate::audit_repo::AuditRepo;
use crate::host_repo::HostRepo;
use crate::metrics_aggregator;
use crate::runtime_gateway::RuntimeGateway;
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, info, instrument, warn};

/// Repos and shutdown for the worker.
pub struct SampleWorkerDeps {
    pub gateway: Arc<RuntimeGateway>,
    pub host_repo: Arc<HostRepo>,
    pub audit_repo: Arc<AuditRepo>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

#[derive(Debug, Clone)]
pub struct SampleWorkerConfig {
    pub interval_secs: u64,
    pub prune_interval_secs: u64,
    pub probe_concurrency: usize,
    /// Cron expression (local time). When unset, VACUUM follows each prune that removed rows.
    pub vacuum_schedule: Option<String>,
}

/// Collect one aggregate and persist it. Returns the number of containers sampled.
pub async fn sample_once(
    gateway: &RuntimeGateway,
    host_repo: &HostRepo,
    audit_repo: &AuditRepo,
    probe_concurrency: usize,
) -> anyhow::Result<usize> {
    let containers = gateway.list_containers(true).await?;
    let host = host_repo.get_host_gauge().await.unwrap_or_else(|e| {
        warn!(error = %e, operation = "get_host_gauge", "host gauge failed");
        Default::default()
    });
    let metrics =
        metrics_aggregator::aggregate(gateway, &containers, host, probe_concurrency).await;
    audit_repo.write_samples(&metrics).await?;
    Ok(metrics.containers.len())
}

pub fn spawn(deps: SampleWorkerDeps, config: SampleWorkerConfig) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(deps, config).await;
    })
}

#[instrument(skip_all, fields(interval_secs = config.interval_secs))]
async fn run(deps: SampleWorkerDeps, config: SampleWorkerConfig) {
    let SampleWorkerDeps {
        gateway,
        host_repo,
        audit_repo,
        mut shutdown_rx,
    } = deps;

    let mut tick = interval(Duration::from_secs(config.interval_secs));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut prune_tick = interval(Duration::from_secs(config.prune_interval_secs));
    prune_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (vacuum_tx, mut vacuum_rx) = tokio::sync::mpsc::channel::<()>(1);
    let scheduler = config
        .vacuum_schedule
        .clone()
        .map(|expr| tokio::spawn(vacuum_scheduler(expr, vacuum_tx.clone())));

    let mut samples_written_total: u64 = 0;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                match sample_once(&gateway, &host_repo, &audit_repo, config.probe_concurrency).await {
                    Ok(n) => {
                        samples_written_total += 1;
                        debug!(containers = n, samples_written_total, "metric sample written");
                    }
                    Err(e) => warn!(error = %e, operation = "sample_once", "metric sampling failed"),
                }
            }
            _ = prune_tick.tick() => {
                match audit_repo.prune_samples().await {
                    Ok(removed) => {
                        debug!(operation = "prune_samples", removed, "expired samples pruned");
                        if removed > 0 && scheduler.is_none() {
                            let _ = vacuum_tx.try_send(());
                        }
                    }
                    Err(e) => warn!(error = %e, operation = "prune_samples", "Failed to prune samples"),
                }
            }
            Some(()) = vacuum_rx.recv() => {
                if let Err(e) = audit_repo.vacuum().await {
                    warn!(error = %e, "vacuum failed");
                } else {
                    info!("vacuum complete");
                }
            }
            _ = &mut shutdown_rx => {
                debug!("Sample worker shutting down");
                break;
            }
        }
    }
    if let Some(handle) = scheduler {
        handle.abort();
    }
}

/// Sends on `tx` at each scheduled VACUUM time. Uses local time for cron.
async fn vacuum_scheduler(cron_str: String, tx: tokio::sync::mpsc::Sender<()>) {
    let Ok(schedule) = cron::Schedule::from_str(&cron_str) else {
        warn!(cron = %cron_str, "invalid vacuum_schedule; VACUUM will not run");
        return;
    };
    loop {
        let now = chrono::Local::now();
        if let Some(next) = schedule.after(&now).next() {
            let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
            tokio::time::sleep(delay).await;
            if tx.send(()).await.is_err() {
                break;
            }
        } else {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}
