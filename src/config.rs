use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// Metric samples older than this are pruned. Audit records are kept.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_retention_days() -> u32 {
    7
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Unix socket of the Docker daemon; unset uses DOCKER_HOST / the platform default.
    pub socket_path: Option<String>,
    pub request_timeout_secs: u64,
    /// Grace period before stop/restart kill the container.
    pub stop_grace_secs: u64,
    pub pull_timeout_secs: u64,
    /// Max stats probes in flight during one aggregation.
    pub probe_concurrency: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            request_timeout_secs: 30,
            stop_grace_secs: 10,
            pull_timeout_secs: 600,
            probe_concurrency: crate::metrics_aggregator::DEFAULT_PROBE_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub prune_interval_secs: u64,
    /// Optional cron expression for VACUUM (e.g. "0 0 3 * * *"). Uses local time.
    pub vacuum_schedule: Option<String>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            prune_interval_secs: 3600,
            vacuum_schedule: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Actor tag written with every audit record.
    pub actor: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            actor: "docker-gui".into(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.retention_days > 0,
            "database.retention_days must be > 0, got {}",
            self.database.retention_days
        );
        anyhow::ensure!(
            self.runtime
                .socket_path
                .as_deref()
                .is_none_or(|p| !p.is_empty()),
            "runtime.socket_path must be non-empty when set"
        );
        anyhow::ensure!(
            self.runtime.request_timeout_secs > 0,
            "runtime.request_timeout_secs must be > 0, got {}",
            self.runtime.request_timeout_secs
        );
        anyhow::ensure!(
            self.runtime.stop_grace_secs <= i32::MAX as u64,
            "runtime.stop_grace_secs must be <= {}, got {}",
            i32::MAX,
            self.runtime.stop_grace_secs
        );
        anyhow::ensure!(
            self.runtime.pull_timeout_secs > 0,
            "runtime.pull_timeout_secs must be > 0, got {}",
            self.runtime.pull_timeout_secs
        );
        anyhow::ensure!(
            self.runtime.probe_concurrency > 0,
            "runtime.probe_concurrency must be > 0, got {}",
            self.runtime.probe_concurrency
        );
        anyhow::ensure!(
            self.sampling.interval_secs > 0,
            "sampling.interval_secs must be > 0, got {}",
            self.sampling.interval_secs
        );
        anyhow::ensure!(
            self.sampling.prune_interval_secs > 0,
            "sampling.prune_interval_secs must be > 0, got {}",
            self.sampling.prune_interval_secs
        );
        if let Some(ref expr) = self.sampling.vacuum_schedule {
            cron::Schedule::from_str(expr).map_err(|e| {
                anyhow::anyhow!("sampling.vacuum_schedule is not a valid cron expression: {}", e)
            })?;
        }
        anyhow::ensure!(
            !self.audit.actor.is_empty(),
            "audit.actor must be non-empty"
        );
        Ok(())
    }
}
