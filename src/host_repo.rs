// Host-level gauge via sysinfo (system CPU and memory for /metrics).

use crate::models::HostGauge;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::System;
use tracing::instrument;

pub struct HostRepo {
    sys: Arc<Mutex<System>>,
    last_cpu_refresh: Arc<Mutex<Option<(Instant, f64)>>>,
}

impl Default for HostRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRepo {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            last_cpu_refresh: Arc::new(Mutex::new(None)),
        }
    }

    /// CPU usage needs two refreshes at least MINIMUM_CPU_UPDATE_INTERVAL apart;
    /// the first call returns 0 and later calls inside the interval return the cached value.
    #[instrument(skip(self), fields(repo = "host", operation = "get_host_gauge"))]
    pub async fn get_host_gauge(&self) -> anyhow::Result<HostGauge> {
        let sys = self.sys.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;

            let now = Instant::now();
            let cpu_percent = {
                let mut guard = last_cpu_refresh
                    .lock()
                    .map_err(|e| anyhow::anyhow!("cpu cache lock poisoned: {}", e))?;
                match *guard {
                    Some((prev_ts, prev_usage))
                        if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
                    {
                        prev_usage
                    }
                    Some(_) => {
                        sys.refresh_cpu_usage();
                        let usage = sys.global_cpu_usage() as f64;
                        *guard = Some((now, usage));
                        usage
                    }
                    None => {
                        sys.refresh_cpu_usage();
                        *guard = Some((now, 0.0));
                        0.0
                    }
                }
            };

            sys.refresh_memory();
            let memory_total = sys.total_memory();
            let memory_used = memory_total.saturating_sub(sys.available_memory());

            Ok(HostGauge {
                cpu_percent: cpu_percent.clamp(0.0, 100.0),
                memory_total,
                memory_used,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }
}
