// Convert bollard API types into our models.

use bollard::container::LogOutput;
use bollard::models::{ContainerStatsResponse, ImageSummary as DockerImage};
use bytes::{BufMut, BytesMut};

use crate::models::{
    BlkioEntry, ContainerState, ContainerSummary, CpuCounters, ImageSummary, InterfaceCounters,
    MountPoint, PortMapping, RawStatsSnapshot, UNTAGGED,
};

pub(crate) fn container_summary(c: bollard::models::ContainerSummary) -> ContainerSummary {
    let ports = c
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| PortMapping {
            ip: p.ip,
            private_port: p.private_port,
            public_port: p.public_port,
            protocol: p.typ.map(|t| t.to_string()),
        })
        .collect();
    let mounts = c
        .mounts
        .unwrap_or_default()
        .into_iter()
        .map(|m| MountPoint {
            kind: m.typ.map(|t| t.to_string()),
            name: m.name,
            source: m.source,
            destination: m.destination,
            driver: m.driver,
            mode: m.mode,
            rw: m.rw.unwrap_or(false),
            propagation: m.propagation,
        })
        .collect();

    ContainerSummary {
        id: c.id.unwrap_or_default(),
        names: c.names.unwrap_or_default(),
        image: c.image.unwrap_or_default(),
        image_id: c.image_id.unwrap_or_default(),
        command: c.command.unwrap_or_default(),
        created: c.created.unwrap_or(0),
        state: c
            .state
            .map(|s| ContainerState::from_docker(&s.to_string()))
            .unwrap_or(ContainerState::Unknown),
        status: c.status.unwrap_or_default(),
        ports,
        mounts,
        labels: c.labels.unwrap_or_default(),
    }
}

pub(crate) fn image_summary(img: DockerImage) -> ImageSummary {
    let repo_tags = if img.repo_tags.is_empty() {
        vec![UNTAGGED.to_string()]
    } else {
        img.repo_tags
    };
    ImageSummary {
        id: img.id,
        repo_tags,
        size: img.size,
        created: img.created,
    }
}

/// Flatten a raw Docker stats response into counter pairs. Missing sections read as zero.
pub(crate) fn raw_snapshot(s: &ContainerStatsResponse) -> RawStatsSnapshot {
    let cpu = s.cpu_stats.as_ref();
    let precpu = s.precpu_stats.as_ref();

    let counters = |stats: Option<&bollard::models::ContainerCpuStats>| CpuCounters {
        total_usage: stats
            .and_then(|c| c.cpu_usage.as_ref())
            .and_then(|u| u.total_usage)
            .unwrap_or(0),
        system_usage: stats.and_then(|c| c.system_cpu_usage).unwrap_or(0),
    };

    // cgroup v1 daemons may omit online_cpus; fall back to the per-cpu vector.
    let online_cpus = cpu
        .and_then(|c| c.online_cpus)
        .filter(|n| *n > 0)
        .or_else(|| {
            cpu.and_then(|c| c.cpu_usage.as_ref())
                .and_then(|u| u.percpu_usage.as_ref())
                .map(|v| v.len() as u32)
                .filter(|n| *n > 0)
        })
        .unwrap_or(1);

    let mut networks: Vec<InterfaceCounters> = s
        .networks
        .as_ref()
        .map(|n| {
            n.iter()
                .map(|(name, v)| InterfaceCounters {
                    name: name.clone(),
                    rx_bytes: v.rx_bytes.unwrap_or(0),
                    tx_bytes: v.tx_bytes.unwrap_or(0),
                    rx_packets: v.rx_packets.unwrap_or(0),
                    tx_packets: v.tx_packets.unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();
    networks.sort_by(|a, b| a.name.cmp(&b.name));

    let blkio = s
        .blkio_stats
        .as_ref()
        .and_then(|b| b.io_service_bytes_recursive.as_ref())
        .map(|entries| {
            entries
                .iter()
                .map(|e| BlkioEntry {
                    op: e.op.clone().unwrap_or_default(),
                    value: e.value.unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    RawStatsSnapshot {
        cpu: counters(cpu),
        precpu: counters(precpu),
        online_cpus,
        memory_usage: s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0),
        memory_limit: s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0),
        networks,
        blkio,
    }
}

/// Re-encode one demultiplexed chunk from bollard as a runtime frame
/// (`[selector, 0, 0, 0, len_be32] + payload`). TTY output has no header.
pub(crate) fn encode_frame(buf: &mut BytesMut, output: LogOutput) {
    let (selector, message) = match output {
        LogOutput::StdIn { message } => (Some(0u8), message),
        LogOutput::StdOut { message } => (Some(1u8), message),
        LogOutput::StdErr { message } => (Some(2u8), message),
        LogOutput::Console { message } => (None, message),
    };
    if let Some(selector) = selector {
        buf.reserve(8 + message.len());
        buf.put_u8(selector);
        buf.put_bytes(0, 3);
        buf.put_u32(message.len() as u32);
    }
    buf.extend_from_slice(&message);
}

/// Append ":latest" when the reference has neither tag nor digest, so a pull fetches one image.
pub(crate) fn with_default_tag(reference: &str) -> String {
    let last_segment = reference.rsplit('/').next().unwrap_or(reference);
    if reference.contains('@') || last_segment.contains(':') {
        reference.to_string()
    } else {
        format!("{reference}:latest")
    }
}
