// Domain models

mod audit;
mod container;
mod image;
mod logs;
mod metrics;
mod stats;

pub use audit::{
    AuditLogRecord, ContainerMetricSample, SYSTEM_CONTAINER_ID, SystemMetricSample,
    UNKNOWN_CONTAINER_NAME,
};
pub use container::{
    ContainerAction, ContainerState, ContainerSummary, MountPoint, PortMapping, display_name,
};
pub use image::{ImageSummary, UNTAGGED};
pub use logs::{LogEntry, LogStream};
pub use metrics::{ContainerMetrics, HostGauge, OverallMetrics};
pub use stats::{
    BlkioEntry, BlockIo, ContainerStats, CpuCounters, InterfaceCounters, MemoryUsage, NetworkIo,
    RawStatsSnapshot,
};
