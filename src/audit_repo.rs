// SQLite audit trail and metric samples. created_at columns are epoch milliseconds.
// audit_log is append-only; only metric samples are pruned by retention.

use crate::models::{
    AuditLogRecord, ContainerMetricSample, OverallMetrics, SystemMetricSample,
};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

pub struct AuditRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl AuditRepo {
    pub async fn connect(path: &str, max_pool_size: u32, retention_days: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        let retention_ms = (retention_days as i64) * 24 * MS_PER_HOUR;
        Ok(Self { pool, retention_ms })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                container_id TEXT NOT NULL,
                container_name TEXT NOT NULL,
                action TEXT NOT NULL,
                actor TEXT NOT NULL,
                details TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS container_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                container_id TEXT NOT NULL,
                container_name TEXT NOT NULL,
                cpu_percent REAL NOT NULL,
                memory_usage INTEGER NOT NULL,
                memory_limit INTEGER NOT NULL,
                network_rx INTEGER NOT NULL,
                network_tx INTEGER NOT NULL,
                block_read INTEGER NOT NULL,
                block_write INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS system_metrics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                total_containers INTEGER NOT NULL,
                running_containers INTEGER NOT NULL,
                stopped_containers INTEGER NOT NULL,
                paused_containers INTEGER NOT NULL,
                total_cpu_percent REAL NOT NULL,
                total_memory_usage INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for stmt in [
            "CREATE INDEX IF NOT EXISTS idx_audit_log_container_id ON audit_log(container_id)",
            "CREATE INDEX IF NOT EXISTS idx_audit_log_created_at ON audit_log(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_container_metrics_container_id ON container_metrics(container_id)",
            "CREATE INDEX IF NOT EXISTS idx_container_metrics_created_at ON container_metrics(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_system_metrics_created_at ON system_metrics(created_at)",
        ] {
            sqlx::query(stmt).execute(&self.pool).await?;
        }

        Ok(())
    }

    /// Append one control-action record stamped with the write time.
    #[instrument(skip(self, details), fields(repo = "audit", operation = "record_action"))]
    pub async fn record_action(
        &self,
        container_id: &str,
        container_name: &str,
        action: &str,
        actor: &str,
        details: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO audit_log (container_id, container_name, action, actor, details, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(container_id)
        .bind(container_name)
        .bind(action)
        .bind(actor)
        .bind(details)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Newest first; all containers when `container_id` is None.
    #[instrument(skip(self), fields(repo = "audit", operation = "read_logs"))]
    pub async fn read_logs(
        &self,
        container_id: Option<&str>,
        limit: u32,
    ) -> anyhow::Result<Vec<AuditLogRecord>> {
        let rows = sqlx::query(
            "SELECT id, container_id, container_name, action, actor, details, created_at
             FROM audit_log
             WHERE ($1 IS NULL OR container_id = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2",
        )
        .bind(container_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_audit_row).collect()
    }

    /// One system row plus one row per running container with a real stats sample,
    /// in a single transaction. Zero-filled records are not stored.
    pub async fn write_samples(&self, metrics: &OverallMetrics) -> anyhow::Result<()> {
        self.write_samples_at(metrics, Utc::now()).await
    }

    #[instrument(skip(self, metrics), fields(repo = "audit", operation = "write_samples", containers = metrics.containers.len()))]
    pub async fn write_samples_at(
        &self,
        metrics: &OverallMetrics,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let created_at = at.timestamp_millis();
        let mut tx = self.pool.begin().await?;

        let total_cpu: f64 = metrics.containers.iter().map(|c| c.cpu_usage).sum();
        let total_memory: u64 = metrics.containers.iter().map(|c| c.memory_usage).sum();
        sqlx::query(
            "INSERT INTO system_metrics (total_containers, running_containers, stopped_containers, paused_containers, total_cpu_percent, total_memory_usage, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(metrics.total_containers as i64)
        .bind(metrics.running_containers as i64)
        .bind(metrics.stopped_containers as i64)
        .bind(metrics.paused_containers as i64)
        .bind(total_cpu)
        .bind(total_memory as i64)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for c in metrics
            .containers
            .iter()
            .filter(|c| c.sampled && c.state == crate::models::ContainerState::Running)
        {
            sqlx::query(
                "INSERT INTO container_metrics (container_id, container_name, cpu_percent, memory_usage, memory_limit, network_rx, network_tx, block_read, block_write, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(&c.container_id)
            .bind(&c.container_name)
            .bind(c.cpu_usage)
            .bind(c.memory_usage as i64)
            .bind(c.memory_limit as i64)
            .bind(c.network_rx as i64)
            .bind(c.network_tx as i64)
            .bind(c.block_read as i64)
            .bind(c.block_write as i64)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Samples for one container in the last `window_hours`, newest first.
    #[instrument(skip(self), fields(repo = "audit", operation = "read_container_metrics"))]
    pub async fn read_container_metrics(
        &self,
        container_id: &str,
        window_hours: u32,
    ) -> anyhow::Result<Vec<ContainerMetricSample>> {
        let rows = sqlx::query(
            "SELECT container_id, container_name, cpu_percent, memory_usage, memory_limit,
                    network_rx, network_tx, block_read, block_write, created_at
             FROM container_metrics
             WHERE container_id = $1 AND created_at >= $2
             ORDER BY created_at DESC, id DESC",
        )
        .bind(container_id)
        .bind(window_start(window_hours))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_container_sample_row).collect()
    }

    /// System-wide samples in the last `window_hours`, newest first.
    #[instrument(skip(self), fields(repo = "audit", operation = "read_system_metrics"))]
    pub async fn read_system_metrics(
        &self,
        window_hours: u32,
    ) -> anyhow::Result<Vec<SystemMetricSample>> {
        let rows = sqlx::query(
            "SELECT total_containers, running_containers, stopped_containers, paused_containers,
                    total_cpu_percent, total_memory_usage, created_at
             FROM system_metrics
             WHERE created_at >= $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(window_start(window_hours))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_system_sample_row).collect()
    }

    /// Delete metric samples older than retention. Returns rows removed.
    #[instrument(skip(self), fields(repo = "audit", operation = "prune_samples"))]
    pub async fn prune_samples(&self) -> anyhow::Result<u64> {
        let cutoff = Utc::now().timestamp_millis() - self.retention_ms;
        let containers = sqlx::query("DELETE FROM container_metrics WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        let system = sqlx::query("DELETE FROM system_metrics WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(containers.rows_affected() + system.rows_affected())
    }

    /// Reclaim space after deletes (run periodically after pruning).
    #[instrument(skip(self), fields(repo = "audit", operation = "vacuum"))]
    pub async fn vacuum(&self) -> anyhow::Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }
}

fn window_start(window_hours: u32) -> i64 {
    Utc::now().timestamp_millis() - (window_hours as i64) * MS_PER_HOUR
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn parse_audit_row(row: &SqliteRow) -> anyhow::Result<AuditLogRecord> {
    Ok(AuditLogRecord {
        id: row.try_get("id")?,
        container_id: row.try_get("container_id")?,
        container_name: row.try_get("container_name")?,
        action: row.try_get("action")?,
        actor: row.try_get("actor")?,
        details: row.try_get("details")?,
        timestamp: from_millis(row.try_get("created_at")?),
    })
}

fn parse_container_sample_row(row: &SqliteRow) -> anyhow::Result<ContainerMetricSample> {
    let u64_col = |name: &str| -> anyhow::Result<u64> { Ok(row.try_get::<i64, _>(name)?.max(0) as u64) };
    Ok(ContainerMetricSample {
        container_id: row.try_get("container_id")?,
        container_name: row.try_get("container_name")?,
        cpu_percent: row.try_get("cpu_percent")?,
        memory_usage: u64_col("memory_usage")?,
        memory_limit: u64_col("memory_limit")?,
        network_rx: u64_col("network_rx")?,
        network_tx: u64_col("network_tx")?,
        block_read: u64_col("block_read")?,
        block_write: u64_col("block_write")?,
        timestamp: from_millis(row.try_get("created_at")?),
    })
}

fn parse_system_sample_row(row: &SqliteRow) -> anyhow::Result<SystemMetricSample> {
    let u32_col = |name: &str| -> anyhow::Result<u32> { Ok(row.try_get::<i64, _>(name)?.max(0) as u32) };
    Ok(SystemMetricSample {
        total_containers: u32_col("total_containers")?,
        running_containers: u32_col("running_containers")?,
        stopped_containers: u32_col("stopped_containers")?,
        paused_containers: u32_col("paused_containers")?,
        total_cpu_percent: row.try_get("total_cpu_percent")?,
        total_memory_usage: row.try_get::<i64, _>("total_memory_usage")?.max(0) as u64,
        timestamp: from_millis(row.try_get("created_at")?),
    })
}
