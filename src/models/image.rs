use serde::{Deserialize, Serialize};

/// Tag reported for dangling images.
pub const UNTAGGED: &str = "<none>:<none>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub size: i64,
    pub created: i64,
}
