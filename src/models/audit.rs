// Audit trail and stored metric samples

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Container id recorded for image-level actions.
pub const SYSTEM_CONTAINER_ID: &str = "system";
/// Container name recorded when the target is not in the listing.
pub const UNKNOWN_CONTAINER_NAME: &str = "unknown";

/// One control action as persisted. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogRecord {
    pub id: i64,
    pub container_id: String,
    pub container_name: String,
    pub action: String,
    pub actor: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerMetricSample {
    pub container_id: String,
    pub container_name: String,
    pub cpu_percent: f64,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub network_rx: u64,
    pub network_tx: u64,
    pub block_read: u64,
    pub block_write: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetricSample {
    pub total_containers: u32,
    pub running_containers: u32,
    pub stopped_containers: u32,
    pub paused_containers: u32,
    pub total_cpu_percent: f64,
    pub total_memory_usage: u64,
    pub timestamp: DateTime<Utc>,
}
