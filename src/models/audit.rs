use serde::{Deserialize, Serialize};

pub const DEFAULT_AUDIT_LIMIT: usize = 100;

/// An immutable audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<i64>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct AuditRecord {
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<i64>,
    pub details: Option<String>,
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
}

impl AuditRecord {
    pub fn action(action: &str) -> Self {
        Self { action: action.to_string(), ..Default::default() }
    }

    pub fn on(mut self, resource_type: &str, resource_id: i64) -> Self {
        self.resource_type = Some(resource_type.to_string());
        self.resource_id = Some(resource_id);
        self
    }
}

#[derive(Debug, Clone)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub limit: usize,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self { action: None, resource_type: None, limit: DEFAULT_AUDIT_LIMIT }
    }
}
