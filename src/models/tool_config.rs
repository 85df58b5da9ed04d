use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIORITY: i64 = 50;

/// Per-tool parameter overrides (nmap, nuclei, sqlmap, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    pub id: i64,
    pub tool_name: String,
    pub default_params: serde_json::Value,
    pub custom_params: serde_json::Value,
    pub is_enabled: bool,
    pub priority: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Upsert payload keyed on `tool_name`. `priority: None` keeps the stored
/// priority (or 50 on insert).
#[derive(Debug, Clone)]
pub struct ToolConfigUpdate {
    pub tool_name: String,
    pub default_params: Option<serde_json::Value>,
    pub custom_params: Option<serde_json::Value>,
    pub is_enabled: bool,
    pub priority: Option<i64>,
}

impl ToolConfigUpdate {
    pub fn new(tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            default_params: None,
            custom_params: None,
            is_enabled: true,
            priority: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: i64,
    pub agent_name: String,
    pub agent_type: Option<String>,
    pub settings: serde_json::Value,
    pub is_enabled: bool,
    pub priority: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct AgentConfigUpdate {
    pub agent_name: String,
    pub agent_type: Option<String>,
    pub settings: Option<serde_json::Value>,
    pub is_enabled: bool,
    pub priority: Option<i64>,
}

impl AgentConfigUpdate {
    pub fn new(agent_name: &str, agent_type: &str) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            agent_type: Some(agent_type.to_string()),
            settings: None,
            is_enabled: true,
            priority: None,
        }
    }
}
