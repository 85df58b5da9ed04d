use std::collections::BTreeMap;
use serde::Serialize;

/// Every table the store manages. Row-count statistics are only ever computed
/// for these names, so no query is built from caller-supplied identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Settings,
    Users,
    Sessions,
    Projects,
    Targets,
    Scans,
    Vulnerabilities,
    ToolConfigs,
    AgentConfigs,
    AuditLog,
    SchemaVersion,
}

impl Table {
    pub const ALL: [Table; 11] = [
        Table::Settings,
        Table::Users,
        Table::Sessions,
        Table::Projects,
        Table::Targets,
        Table::Scans,
        Table::Vulnerabilities,
        Table::ToolConfigs,
        Table::AgentConfigs,
        Table::AuditLog,
        Table::SchemaVersion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Settings => "settings",
            Table::Users => "users",
            Table::Sessions => "sessions",
            Table::Projects => "projects",
            Table::Targets => "targets",
            Table::Scans => "scans",
            Table::Vulnerabilities => "vulnerabilities",
            Table::ToolConfigs => "tool_configs",
            Table::AgentConfigs => "agent_configs",
            Table::AuditLog => "audit_log",
            Table::SchemaVersion => "schema_version",
        }
    }

    /// Exact, case-sensitive match against the known table names.
    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    /// `None` for in-memory stores.
    pub database_path: Option<String>,
    pub database_size_bytes: u64,
    pub schema_version: i64,
    pub current_schema_version: i64,
    pub table_counts: BTreeMap<Table, i64>,
}

impl DatabaseStats {
    pub fn count(&self, table: Table) -> i64 {
        self.table_counts.get(&table).copied().unwrap_or(0)
    }
}
