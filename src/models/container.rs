// Docker container models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ServiceError;

/// Docker container state; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    #[serde(other)]
    Unknown,
}

impl ContainerState {
    /// Parse from Docker API state string (e.g. "running", "exited").
    pub fn from_docker(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "removing" => ContainerState::Removing,
            "exited" => ContainerState::Exited,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    pub ip: Option<String>,
    pub private_port: u16,
    pub public_port: Option<u16>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountPoint {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub driver: Option<String>,
    pub mode: Option<String>,
    pub rw: bool,
    pub propagation: Option<String>,
}

/// One row of the container listing. Rebuilt on every list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub image_id: String,
    pub command: String,
    pub created: i64,
    pub state: ContainerState,
    pub status: String,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub mounts: Vec<MountPoint>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl ContainerSummary {
    /// First name without the leading '/', or "Unknown" when the runtime reports none.
    pub fn display_name(&self) -> String {
        display_name(&self.names)
    }

    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }

    /// Matches a full id or any of the container's names (with or without the leading '/').
    pub fn matches(&self, id_or_name: &str) -> bool {
        self.id == id_or_name
            || self
                .names
                .iter()
                .any(|n| n.trim_start_matches('/') == id_or_name.trim_start_matches('/'))
    }
}

pub fn display_name(names: &[String]) -> String {
    names
        .first()
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| "Unknown".into())
}

/// Control actions accepted by the generic action endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
    Remove,
}

impl ContainerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Restart => "restart",
            ContainerAction::Remove => "remove",
        }
    }

    /// Audit tag for a failed attempt, e.g. "stop_failed".
    pub fn failed_tag(&self) -> String {
        format!("{}_failed", self.as_str())
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            ContainerAction::Start => "Container started successfully",
            ContainerAction::Stop => "Container stopped successfully",
            ContainerAction::Restart => "Container restarted successfully",
            ContainerAction::Remove => "Container removed successfully",
        }
    }
}

impl FromStr for ContainerAction {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ContainerAction::Start),
            "stop" => Ok(ContainerAction::Stop),
            "restart" => Ok(ContainerAction::Restart),
            "remove" => Ok(ContainerAction::Remove),
            other => Err(ServiceError::InvalidRequest(format!(
                "invalid action: {other}"
            ))),
        }
    }
}
