// Config loading and validation tests

use dockpanel::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 8080
host = "0.0.0.0"

[database]
path = "data/dockpanel.db"
max_pool_size = 5
retention_days = 14

[runtime]
socket_path = "/var/run/docker.sock"
request_timeout_secs = 20
stop_grace_secs = 5
pull_timeout_secs = 300
probe_concurrency = 4

[sampling]
enabled = false
interval_secs = 30
prune_interval_secs = 600
vacuum_schedule = "0 0 3 * * *"

[audit]
actor = "ops"
"#;

const MINIMAL_CONFIG: &str = r#"
[server]
port = 8080
host = "127.0.0.1"

[database]
path = "data/dockpanel.db"
max_pool_size = 5
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.database.path, "data/dockpanel.db");
    assert_eq!(config.database.retention_days, 14);
    assert_eq!(
        config.runtime.socket_path.as_deref(),
        Some("/var/run/docker.sock")
    );
    assert_eq!(config.runtime.request_timeout_secs, 20);
    assert_eq!(config.runtime.stop_grace_secs, 5);
    assert_eq!(config.runtime.pull_timeout_secs, 300);
    assert_eq!(config.runtime.probe_concurrency, 4);
    assert!(!config.sampling.enabled);
    assert_eq!(config.sampling.interval_secs, 30);
    assert_eq!(config.sampling.prune_interval_secs, 600);
    assert_eq!(
        config.sampling.vacuum_schedule.as_deref(),
        Some("0 0 3 * * *")
    );
    assert_eq!(config.audit.actor, "ops");
}

#[test]
fn test_optional_sections_default() {
    let config = AppConfig::load_from_str(MINIMAL_CONFIG).expect("load_from_str");
    assert_eq!(config.database.retention_days, 7);
    assert!(config.runtime.socket_path.is_none());
    assert_eq!(config.runtime.request_timeout_secs, 30);
    assert_eq!(config.runtime.stop_grace_secs, 10);
    assert_eq!(config.runtime.pull_timeout_secs, 600);
    assert_eq!(config.runtime.probe_concurrency, 8);
    assert!(config.sampling.enabled);
    assert_eq!(config.sampling.interval_secs, 60);
    assert_eq!(config.sampling.prune_interval_secs, 3600);
    assert!(config.sampling.vacuum_schedule.is_none());
    assert_eq!(config.audit.actor, "docker-gui");
}

#[test]
fn test_partial_runtime_section_keeps_other_defaults() {
    let cfg = format!("{}\n[runtime]\nprobe_concurrency = 2\n", MINIMAL_CONFIG);
    let config = AppConfig::load_from_str(&cfg).unwrap();
    assert_eq!(config.runtime.probe_concurrency, 2);
    assert_eq!(config.runtime.request_timeout_secs, 30);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8080", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = VALID_CONFIG.replace("path = \"data/dockpanel.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_zero_pool() {
    let bad = VALID_CONFIG.replace("max_pool_size = 5", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.max_pool_size"));
}

#[test]
fn test_config_validation_rejects_zero_retention() {
    let bad = VALID_CONFIG.replace("retention_days = 14", "retention_days = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.retention_days"));
}

#[test]
fn test_config_validation_rejects_empty_socket_path() {
    let bad = VALID_CONFIG.replace(
        "socket_path = \"/var/run/docker.sock\"",
        "socket_path = \"\"",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("runtime.socket_path"));
}

#[test]
fn test_config_validation_rejects_zero_timeouts() {
    let bad = VALID_CONFIG.replace("request_timeout_secs = 20", "request_timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("runtime.request_timeout_secs"));

    let bad = VALID_CONFIG.replace("pull_timeout_secs = 300", "pull_timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("runtime.pull_timeout_secs"));
}

#[test]
fn test_config_validation_rejects_oversized_stop_grace() {
    let bad = VALID_CONFIG.replace("stop_grace_secs = 5", "stop_grace_secs = 4294967296");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("runtime.stop_grace_secs"));

    let ok = VALID_CONFIG.replace("stop_grace_secs = 5", "stop_grace_secs = 2147483647");
    assert!(AppConfig::load_from_str(&ok).is_ok());
}

#[test]
fn test_config_validation_rejects_zero_probe_concurrency() {
    let bad = VALID_CONFIG.replace("probe_concurrency = 4", "probe_concurrency = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("runtime.probe_concurrency"));
}

#[test]
fn test_config_validation_rejects_zero_sampling_intervals() {
    let bad = VALID_CONFIG.replace("\ninterval_secs = 30", "\ninterval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sampling.interval_secs"));

    let bad = VALID_CONFIG.replace("prune_interval_secs = 600", "prune_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sampling.prune_interval_secs"));
}

#[test]
fn test_config_validation_rejects_bad_cron() {
    let bad = VALID_CONFIG.replace("\"0 0 3 * * *\"", "\"not a cron\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sampling.vacuum_schedule"));
}

#[test]
fn test_config_validation_rejects_empty_actor() {
    let bad = VALID_CONFIG.replace("actor = \"ops\"", "actor = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("audit.actor"));
}

#[test]
fn test_config_missing_server_section_fails() {
    let bad = MINIMAL_CONFIG.replace("[server]\nport = 8080\nhost = \"127.0.0.1\"\n", "");
    assert!(AppConfig::load_from_str(&bad).is_err());
}
