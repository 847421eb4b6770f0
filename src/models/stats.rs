// Raw counter snapshot and derived per-container stats

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pair of CPU counter readings (cumulative nanoseconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuCounters {
    pub total_usage: u64,
    pub system_usage: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceCounters {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
}

/// Block-IO service-bytes entry; `op` is the runtime's tag ("Read", "Write", "Sync", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlkioEntry {
    pub op: String,
    pub value: u64,
}

/// A single stats response: current and immediately-preceding counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatsSnapshot {
    pub cpu: CpuCounters,
    pub precpu: CpuCounters,
    pub online_cpus: u32,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub networks: Vec<InterfaceCounters>,
    pub blkio: Vec<BlkioEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub usage: u64,
    pub limit: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkIo {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockIo {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Point-in-time stats derived from a [`RawStatsSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStats {
    pub id: String,
    pub cpu_percent: f64,
    pub memory: MemoryUsage,
    pub network: NetworkIo,
    #[serde(rename = "blockIO")]
    pub block_io: BlockIo,
    pub time: DateTime<Utc>,
}
