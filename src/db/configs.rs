use rusqlite::OptionalExtension;
use tracing::debug;
use crate::errors::{sql_err, HexstrikeError};
use crate::models::{AgentConfig, AgentConfigUpdate, ToolConfig, ToolConfigUpdate, DEFAULT_PRIORITY};
use super::codec;
use super::connection::now;
use super::Database;

const TOOL_COLUMNS: &str =
    "id, tool_name, default_params, custom_params, is_enabled, priority, created_at, updated_at";
const AGENT_COLUMNS: &str =
    "id, agent_name, agent_type, settings, is_enabled, priority, created_at, updated_at";

impl Database {
    /// Insert or replace the configuration for a tool, keyed on its name.
    /// A missing priority keeps the stored one.
    pub fn set_tool_config(&self, config: &ToolConfigUpdate) -> Result<(), HexstrikeError> {
        if config.tool_name.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput("Tool name is required".into()));
        }
        self.with_tx(|tx| {
            let ts = now();
            tx.execute(
                "INSERT INTO tool_configs
                    (tool_name, default_params, custom_params, is_enabled, priority,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, COALESCE(?5, ?6), ?7, ?7)
                 ON CONFLICT(tool_name) DO UPDATE SET
                    default_params = excluded.default_params,
                    custom_params = excluded.custom_params,
                    is_enabled = excluded.is_enabled,
                    priority = COALESCE(?5, tool_configs.priority),
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    config.tool_name,
                    codec::json_text(config.default_params.as_ref()),
                    codec::json_text(config.custom_params.as_ref()),
                    config.is_enabled,
                    config.priority,
                    DEFAULT_PRIORITY,
                    ts
                ],
            )
            .map_err(sql_err("Failed to save tool config"))?;
            debug!(tool = %config.tool_name, "Tool config saved");
            Ok(())
        })
    }

    pub fn get_tool_config(&self, tool_name: &str) -> Result<Option<ToolConfig>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!("SELECT {} FROM tool_configs WHERE tool_name = ?1", TOOL_COLUMNS),
                rusqlite::params![tool_name],
                read_tool_row,
            )
            .optional()
            .map_err(sql_err("Failed to read tool config"))
        })
    }

    /// All tool configurations by ascending priority, then name.
    pub fn get_all_tool_configs(
        &self,
        enabled_only: bool,
    ) -> Result<Vec<ToolConfig>, HexstrikeError> {
        self.with_tx(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {} FROM tool_configs WHERE (?1 = 0 OR is_enabled = 1)
                     ORDER BY priority, tool_name",
                    TOOL_COLUMNS
                ))
                .map_err(sql_err("Query failed"))?;
            let rows = stmt
                .query_map(rusqlite::params![enabled_only], read_tool_row)
                .map_err(sql_err("Query error"))?;

            let mut configs = Vec::new();
            for row in rows {
                configs.push(row.map_err(sql_err("Row error"))?);
            }
            Ok(configs)
        })
    }

    pub fn delete_tool_config(&self, tool_name: &str) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "DELETE FROM tool_configs WHERE tool_name = ?1",
                    rusqlite::params![tool_name],
                )
                .map_err(sql_err("Delete failed"))?;
            Ok(affected > 0)
        })
    }

    pub fn set_agent_config(&self, config: &AgentConfigUpdate) -> Result<(), HexstrikeError> {
        if config.agent_name.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput("Agent name is required".into()));
        }
        self.with_tx(|tx| {
            let ts = now();
            tx.execute(
                "INSERT INTO agent_configs
                    (agent_name, agent_type, settings, is_enabled, priority, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, COALESCE(?5, ?6), ?7, ?7)
                 ON CONFLICT(agent_name) DO UPDATE SET
                    agent_type = excluded.agent_type,
                    settings = excluded.settings,
                    is_enabled = excluded.is_enabled,
                    priority = COALESCE(?5, agent_configs.priority),
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    config.agent_name,
                    config.agent_type,
                    codec::json_text(config.settings.as_ref()),
                    config.is_enabled,
                    config.priority,
                    DEFAULT_PRIORITY,
                    ts
                ],
            )
            .map_err(sql_err("Failed to save agent config"))?;
            debug!(agent = %config.agent_name, "Agent config saved");
            Ok(())
        })
    }

    pub fn get_agent_config(
        &self,
        agent_name: &str,
    ) -> Result<Option<AgentConfig>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!("SELECT {} FROM agent_configs WHERE agent_name = ?1", AGENT_COLUMNS),
                rusqlite::params![agent_name],
                read_agent_row,
            )
            .optional()
            .map_err(sql_err("Failed to read agent config"))
        })
    }

    pub fn get_all_agent_configs(
        &self,
        enabled_only: bool,
    ) -> Result<Vec<AgentConfig>, HexstrikeError> {
        self.with_tx(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {} FROM agent_configs WHERE (?1 = 0 OR is_enabled = 1)
                     ORDER BY priority, agent_name",
                    AGENT_COLUMNS
                ))
                .map_err(sql_err("Query failed"))?;
            let rows = stmt
                .query_map(rusqlite::params![enabled_only], read_agent_row)
                .map_err(sql_err("Query error"))?;

            let mut configs = Vec::new();
            for row in rows {
                configs.push(row.map_err(sql_err("Row error"))?);
            }
            Ok(configs)
        })
    }

    pub fn delete_agent_config(&self, agent_name: &str) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "DELETE FROM agent_configs WHERE agent_name = ?1",
                    rusqlite::params![agent_name],
                )
                .map_err(sql_err("Delete failed"))?;
            Ok(affected > 0)
        })
    }
}

fn read_tool_row(row: &rusqlite::Row) -> rusqlite::Result<ToolConfig> {
    Ok(ToolConfig {
        id: row.get(0)?,
        tool_name: row.get(1)?,
        default_params: codec::json_or_empty(row.get(2)?),
        custom_params: codec::json_or_empty(row.get(3)?),
        is_enabled: row.get::<_, Option<bool>>(4)?.unwrap_or(true),
        priority: row.get::<_, Option<i64>>(5)?.unwrap_or(DEFAULT_PRIORITY),
        created_at: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

fn read_agent_row(row: &rusqlite::Row) -> rusqlite::Result<AgentConfig> {
    Ok(AgentConfig {
        id: row.get(0)?,
        agent_name: row.get(1)?,
        agent_type: row.get(2)?,
        settings: codec::json_or_empty(row.get(3)?),
        is_enabled: row.get::<_, Option<bool>>(4)?.unwrap_or(true),
        priority: row.get::<_, Option<i64>>(5)?.unwrap_or(DEFAULT_PRIORITY),
        created_at: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_db_tool_config_defaults() {
        let db = Database::in_memory().unwrap();
        db.set_tool_config(&ToolConfigUpdate::new("nmap")).unwrap();

        let cfg = db.get_tool_config("nmap").unwrap().unwrap();
        assert_eq!(cfg.priority, DEFAULT_PRIORITY);
        assert!(cfg.is_enabled);
        assert_eq!(cfg.default_params, json!({}));
        assert_eq!(cfg.custom_params, json!({}));
    }

    #[test]
    fn test_db_tool_config_upsert_keeps_priority() {
        let db = Database::in_memory().unwrap();
        db.set_tool_config(&ToolConfigUpdate {
            default_params: Some(json!({"timing": "T4"})),
            priority: Some(10),
            ..ToolConfigUpdate::new("nmap")
        })
        .unwrap();
        let first = db.get_tool_config("nmap").unwrap().unwrap();

        db.set_tool_config(&ToolConfigUpdate {
            custom_params: Some(json!({"ports": "1-1024"})),
            is_enabled: false,
            ..ToolConfigUpdate::new("nmap")
        })
        .unwrap();

        let cfg = db.get_tool_config("nmap").unwrap().unwrap();
        assert_eq!(cfg.id, first.id);
        assert_eq!(cfg.priority, 10);
        assert!(!cfg.is_enabled);
        assert_eq!(cfg.default_params, json!({}));
        assert_eq!(cfg.custom_params["ports"], "1-1024");
        assert_eq!(cfg.created_at, first.created_at);
    }

    #[test]
    fn test_db_tool_configs_ordered_and_filtered() {
        let db = Database::in_memory().unwrap();
        let prioritized = |name: &str, priority: i64| ToolConfigUpdate {
            priority: Some(priority),
            ..ToolConfigUpdate::new(name)
        };
        db.set_tool_config(&prioritized("sqlmap", 30)).unwrap();
        db.set_tool_config(&prioritized("nuclei", 10)).unwrap();
        db.set_tool_config(&prioritized("httpx", 10)).unwrap();
        let disabled = ToolConfigUpdate { is_enabled: false, ..ToolConfigUpdate::new("nikto") };
        db.set_tool_config(&disabled).unwrap();

        let names: Vec<String> = db
            .get_all_tool_configs(false)
            .unwrap()
            .into_iter()
            .map(|c| c.tool_name)
            .collect();
        assert_eq!(names, vec!["httpx", "nuclei", "sqlmap", "nikto"]);

        let enabled = db.get_all_tool_configs(true).unwrap();
        assert_eq!(enabled.len(), 3);
        assert!(enabled.iter().all(|c| c.is_enabled));
    }

    #[test]
    fn test_db_tool_config_delete_and_validation() {
        let db = Database::in_memory().unwrap();
        db.set_tool_config(&ToolConfigUpdate::new("ffuf")).unwrap();
        assert!(db.delete_tool_config("ffuf").unwrap());
        assert!(!db.delete_tool_config("ffuf").unwrap());
        assert!(db.get_tool_config("ffuf").unwrap().is_none());

        let err = db.set_tool_config(&ToolConfigUpdate::new("")).unwrap_err();
        assert!(matches!(err, HexstrikeError::InvalidInput(_)));
    }

    #[test]
    fn test_db_agent_config_roundtrip() {
        let db = Database::in_memory().unwrap();
        db.set_agent_config(&AgentConfigUpdate {
            settings: Some(json!({"model": "local", "max_steps": 12})),
            priority: Some(5),
            ..AgentConfigUpdate::new("recon-agent", "recon")
        })
        .unwrap();
        db.set_agent_config(&AgentConfigUpdate::new("exploit-agent", "exploit")).unwrap();

        let recon = db.get_agent_config("recon-agent").unwrap().unwrap();
        assert_eq!(recon.agent_type.as_deref(), Some("recon"));
        assert_eq!(recon.settings["max_steps"], 12);
        assert_eq!(recon.priority, 5);

        db.set_agent_config(&AgentConfigUpdate {
            is_enabled: false,
            ..AgentConfigUpdate::new("recon-agent", "recon")
        })
        .unwrap();
        let recon = db.get_agent_config("recon-agent").unwrap().unwrap();
        assert_eq!(recon.priority, 5);
        assert!(!recon.is_enabled);

        let all: Vec<String> = db
            .get_all_agent_configs(false)
            .unwrap()
            .into_iter()
            .map(|c| c.agent_name)
            .collect();
        assert_eq!(all, vec!["recon-agent", "exploit-agent"]);
        assert_eq!(db.get_all_agent_configs(true).unwrap().len(), 1);

        assert!(db.delete_agent_config("exploit-agent").unwrap());
        assert!(db.get_agent_config("exploit-agent").unwrap().is_none());
    }
}
