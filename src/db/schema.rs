//! Versioned, additive schema management.
//!
//! Every migration is a batch of `CREATE ... IF NOT EXISTS` statements, so
//! re-applying one is harmless. Nothing here drops, renames or rewrites an
//! existing table or column.

use rusqlite::{Connection, OptionalExtension};
use tracing::info;
use crate::errors::{sql_err, HexstrikeError};
use super::connection::now;
use super::defaults::DEFAULT_SETTINGS;

/// Schema version this build writes. Bump it when appending a migration.
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: SCHEMA_V1,
    },
    Migration {
        version: 2,
        description: "Lookup indexes for targets, vulnerabilities, scans and audit log",
        sql: SCHEMA_V2,
    },
];

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT,
    value_type TEXT DEFAULT 'string',
    description TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(category, key)
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT,
    password_hash TEXT,
    role TEXT DEFAULT 'user',
    is_active BOOLEAN DEFAULT 1,
    preferences TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    last_login TIMESTAMP
);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    session_token TEXT UNIQUE NOT NULL,
    ip_address TEXT,
    user_agent TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    expires_at TIMESTAMP,
    is_active BOOLEAN DEFAULT 1,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    client TEXT,
    status TEXT DEFAULT 'active',
    settings TEXT,
    created_by INTEGER,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (created_by) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS targets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER,
    target TEXT NOT NULL,
    target_type TEXT,
    status TEXT DEFAULT 'pending',
    metadata TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (project_id) REFERENCES projects(id)
);

CREATE TABLE IF NOT EXISTS scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER,
    target_id INTEGER,
    scan_type TEXT NOT NULL,
    status TEXT DEFAULT 'pending',
    progress INTEGER DEFAULT 0,
    current_phase TEXT,
    tools_used TEXT,
    results TEXT,
    started_at TIMESTAMP,
    completed_at TIMESTAMP,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (project_id) REFERENCES projects(id),
    FOREIGN KEY (target_id) REFERENCES targets(id)
);

CREATE TABLE IF NOT EXISTS vulnerabilities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_id INTEGER,
    project_id INTEGER,
    title TEXT NOT NULL,
    description TEXT,
    severity TEXT,
    cvss_score REAL,
    cve_id TEXT,
    cwe_id TEXT,
    location TEXT,
    proof_of_concept TEXT,
    remediation TEXT,
    status TEXT DEFAULT 'new',
    discovered_by TEXT,
    discovered_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    verified_at TIMESTAMP,
    FOREIGN KEY (scan_id) REFERENCES scans(id),
    FOREIGN KEY (project_id) REFERENCES projects(id)
);

CREATE TABLE IF NOT EXISTS tool_configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tool_name TEXT UNIQUE NOT NULL,
    default_params TEXT,
    custom_params TEXT,
    is_enabled BOOLEAN DEFAULT 1,
    priority INTEGER DEFAULT 50,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS agent_configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_name TEXT UNIQUE NOT NULL,
    agent_type TEXT,
    settings TEXT,
    is_enabled BOOLEAN DEFAULT 1,
    priority INTEGER DEFAULT 50,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    action TEXT NOT NULL,
    resource_type TEXT,
    resource_id INTEGER,
    details TEXT,
    ip_address TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version INTEGER NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_settings_category ON settings(category);
CREATE INDEX IF NOT EXISTS idx_scans_project ON scans(project_id);
CREATE INDEX IF NOT EXISTS idx_vulns_scan ON vulnerabilities(scan_id);
CREATE INDEX IF NOT EXISTS idx_vulns_severity ON vulnerabilities(severity);
CREATE INDEX IF NOT EXISTS idx_audit_action ON audit_log(action);
";

const SCHEMA_V2: &str = "
CREATE INDEX IF NOT EXISTS idx_targets_project ON targets(project_id);
CREATE INDEX IF NOT EXISTS idx_vulns_project ON vulnerabilities(project_id);
CREATE INDEX IF NOT EXISTS idx_vulns_status ON vulnerabilities(status);
CREATE INDEX IF NOT EXISTS idx_scans_created ON scans(created_at);
CREATE INDEX IF NOT EXISTS idx_audit_resource ON audit_log(resource_type);
";

/// What `initialize` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Stored version was already current; nothing was touched.
    UpToDate { version: i64 },
    /// Fresh store, schema created.
    Created { version: i64 },
    /// Older store, additive migrations applied.
    Upgraded { from: i64, to: i64 },
}

/// Highest version recorded in `schema_version`, or 0 when the table does not
/// exist yet.
pub fn stored_version(conn: &Connection) -> Result<i64, HexstrikeError> {
    let exists: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(sql_err("Failed to inspect schema"))?;
    if exists.is_none() {
        return Ok(0);
    }

    let version: Option<i64> = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
        .map_err(sql_err("Failed to read schema version"))?;
    Ok(version.unwrap_or(0))
}

pub(crate) fn initialize(conn: &mut Connection) -> Result<InitOutcome, HexstrikeError> {
    let tx = conn.transaction().map_err(sql_err("Failed to begin transaction"))?;

    let stored = stored_version(&tx)?;
    if stored >= CURRENT_SCHEMA_VERSION {
        info!(version = stored, "Database schema is up to date");
        return Ok(InitOutcome::UpToDate { version: stored });
    }

    if stored > 0 {
        info!(from = stored, to = CURRENT_SCHEMA_VERSION, "Upgrading database schema");
    } else {
        info!(version = CURRENT_SCHEMA_VERSION, "Creating new database schema");
    }

    // Every migration is idempotent, so all of them run; a store that claims
    // an older version but lost a table gets it back.
    for migration in MIGRATIONS {
        tx.execute_batch(migration.sql).map_err(|e| {
            let context = format!(
                "Failed to apply schema migration {} ({})",
                migration.version, migration.description
            );
            HexstrikeError::from_sqlite(&context, e)
        })?;
    }

    let ts = now();
    for d in DEFAULT_SETTINGS {
        tx.execute(
            "INSERT OR IGNORE INTO settings
                (category, key, value, value_type, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            rusqlite::params![d.category, d.key, d.value, d.value_type.as_str(), d.description, ts],
        )
        .map_err(sql_err("Failed to insert default settings"))?;
    }

    tx.execute(
        "INSERT INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            CURRENT_SCHEMA_VERSION,
            ts,
            format!("Schema version {} applied", CURRENT_SCHEMA_VERSION)
        ],
    )
    .map_err(sql_err("Failed to record schema version"))?;

    tx.commit().map_err(sql_err("Failed to commit schema"))?;
    info!(version = CURRENT_SCHEMA_VERSION, "Database schema initialized successfully");

    Ok(if stored > 0 {
        InitOutcome::Upgraded { from: stored, to: CURRENT_SCHEMA_VERSION }
    } else {
        InitOutcome::Created { version: CURRENT_SCHEMA_VERSION }
    })
}
