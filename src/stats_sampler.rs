// Derive percentages and byte totals from one raw stats snapshot.

use chrono::{DateTime, Utc};

use crate::models::{
    BlkioEntry, BlockIo, ContainerStats, InterfaceCounters, MemoryUsage, NetworkIo,
    RawStatsSnapshot,
};

/// Convert a raw snapshot into [`ContainerStats`]. Never fails; degenerate inputs yield zeros.
pub fn compute_stats(
    id: &str,
    snapshot: &RawStatsSnapshot,
    sampled_at: DateTime<Utc>,
) -> ContainerStats {
    ContainerStats {
        id: id.to_string(),
        cpu_percent: cpu_percent(snapshot),
        memory: memory_usage(snapshot.memory_usage, snapshot.memory_limit),
        network: sum_networks(&snapshot.networks),
        block_io: sum_block_io(&snapshot.blkio),
        time: sampled_at,
    }
}

/// `(cpu_delta / system_delta) * cpus * 100`; 0 when either delta is not positive
/// (counter reset, first sample) or no CPU count is known.
pub fn cpu_percent(snapshot: &RawStatsSnapshot) -> f64 {
    let cpu_delta = snapshot
        .cpu
        .total_usage
        .checked_sub(snapshot.precpu.total_usage)
        .unwrap_or(0);
    let system_delta = snapshot
        .cpu
        .system_usage
        .checked_sub(snapshot.precpu.system_usage)
        .unwrap_or(0);
    if cpu_delta == 0 || system_delta == 0 || snapshot.online_cpus == 0 {
        return 0.0;
    }
    (cpu_delta as f64 / system_delta as f64) * snapshot.online_cpus as f64 * 100.0
}

/// A zero limit means no limit configured, so the percent is 0 rather than inf/NaN.
pub fn memory_usage(usage: u64, limit: u64) -> MemoryUsage {
    let percent = if limit > 0 {
        usage as f64 / limit as f64 * 100.0
    } else {
        0.0
    };
    MemoryUsage {
        usage,
        limit,
        percent,
    }
}

fn sum_networks(interfaces: &[InterfaceCounters]) -> NetworkIo {
    interfaces.iter().fold(NetworkIo::default(), |acc, n| NetworkIo {
        rx_bytes: acc.rx_bytes.saturating_add(n.rx_bytes),
        tx_bytes: acc.tx_bytes.saturating_add(n.tx_bytes),
        rx_packets: acc.rx_packets.saturating_add(n.rx_packets),
        tx_packets: acc.tx_packets.saturating_add(n.tx_packets),
    })
}

// Only Read/Write entries count; Sync, Async, Total etc. are skipped.
fn sum_block_io(entries: &[BlkioEntry]) -> BlockIo {
    let mut out = BlockIo::default();
    for e in entries {
        if e.op.eq_ignore_ascii_case("read") {
            out.read_bytes = out.read_bytes.saturating_add(e.value);
        } else if e.op.eq_ignore_ascii_case("write") {
            out.write_bytes = out.write_bytes.saturating_add(e.value);
        }
    }
    out
}
