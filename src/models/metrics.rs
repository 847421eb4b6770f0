// Aggregated metrics returned by /metrics

use serde::{Deserialize, Serialize};

use super::{ContainerState, ContainerStats, ContainerSummary};

/// Host-level gauge (sysinfo): global CPU and memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostGauge {
    pub cpu_percent: f64,
    pub memory_total: u64,
    pub memory_used: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMetrics {
    pub container_id: String,
    pub container_name: String,
    pub image: String,
    pub state: ContainerState,
    pub cpu_usage: f64,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub memory_percent: f64,
    pub network_rx: u64,
    pub network_tx: u64,
    pub block_read: u64,
    pub block_write: u64,
    /// block_read + block_write
    pub disk_usage: u64,
    /// Unix seconds.
    pub timestamp: i64,
    /// False when the values are zero-filled (not running, or the stats probe failed).
    #[serde(default)]
    pub sampled: bool,
}

impl ContainerMetrics {
    /// Zero-valued record for a container that is not running or whose probe failed.
    pub fn zeroed(container: &ContainerSummary) -> Self {
        Self {
            container_id: container.id.clone(),
            container_name: container.display_name(),
            image: container.image.clone(),
            state: container.state,
            cpu_usage: 0.0,
            memory_usage: 0,
            memory_limit: 0,
            memory_percent: 0.0,
            network_rx: 0,
            network_tx: 0,
            block_read: 0,
            block_write: 0,
            disk_usage: 0,
            timestamp: chrono::Utc::now().timestamp(),
            sampled: false,
        }
    }

    pub fn from_stats(container: &ContainerSummary, stats: &ContainerStats) -> Self {
        Self {
            container_id: container.id.clone(),
            container_name: container.display_name(),
            image: container.image.clone(),
            state: container.state,
            cpu_usage: stats.cpu_percent,
            memory_usage: stats.memory.usage,
            memory_limit: stats.memory.limit,
            memory_percent: stats.memory.percent,
            network_rx: stats.network.rx_bytes,
            network_tx: stats.network.tx_bytes,
            block_read: stats.block_io.read_bytes,
            block_write: stats.block_io.write_bytes,
            disk_usage: stats
                .block_io
                .read_bytes
                .saturating_add(stats.block_io.write_bytes),
            timestamp: stats.time.timestamp(),
            sampled: true,
        }
    }

    pub fn is_zeroed(&self) -> bool {
        self.cpu_usage == 0.0
            && self.memory_usage == 0
            && self.memory_limit == 0
            && self.network_rx == 0
            && self.network_tx == 0
            && self.disk_usage == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallMetrics {
    pub total_containers: u32,
    pub running_containers: u32,
    pub stopped_containers: u32,
    pub paused_containers: u32,
    pub system_cpu: f64,
    pub system_memory: u64,
    pub system_memory_used: u64,
    /// Same order as the container listing.
    pub containers: Vec<ContainerMetrics>,
}
