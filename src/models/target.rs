use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Excluded,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Excluded => "excluded",
        }
    }

    pub fn from_db(s: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap_or_default()
    }
}

/// A host, URL, network range or repository in scope for a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub project_id: Option<i64>,
    pub target: String,
    /// Free-form kind, e.g. "url", "ip", "cidr", "domain".
    pub target_type: Option<String>,
    pub status: TargetStatus,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewTarget {
    pub project_id: Option<i64>,
    pub target: String,
    pub target_type: Option<String>,
    pub metadata: Option<serde_json::Value>,
}
