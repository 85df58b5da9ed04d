use crate::errors::{sql_err, HexstrikeError};
use crate::models::{AuditEntry, AuditFilter, AuditRecord};
use super::connection::now;
use super::Database;

impl Database {
    /// Append an entry to the audit trail. Entries are never updated.
    pub fn log_action(&self, record: &AuditRecord) -> Result<i64, HexstrikeError> {
        if record.action.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput("Audit action is required".into()));
        }
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO audit_log
                    (user_id, action, resource_type, resource_id, details, ip_address, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    record.user_id,
                    record.action,
                    record.resource_type,
                    record.resource_id,
                    record.details,
                    record.ip_address,
                    now()
                ],
            )
            .map_err(sql_err("Failed to write audit log"))?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Newest entries first.
    pub fn get_audit_log(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, HexstrikeError> {
        self.with_tx(|tx| {
            let mut stmt = tx
                .prepare(
                    "SELECT id, user_id, action, resource_type, resource_id, details, ip_address,
                            created_at
                     FROM audit_log
                     WHERE (?1 IS NULL OR action = ?1) AND (?2 IS NULL OR resource_type = ?2)
                     ORDER BY julianday(created_at) DESC, id DESC
                     LIMIT ?3",
                )
                .map_err(sql_err("Query failed"))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![filter.action, filter.resource_type, filter.limit as i64],
                    |row| {
                        Ok(AuditEntry {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            action: row.get(2)?,
                            resource_type: row.get(3)?,
                            resource_id: row.get(4)?,
                            details: row.get(5)?,
                            ip_address: row.get(6)?,
                            created_at: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                        })
                    },
                )
                .map_err(sql_err("Query error"))?;

            let mut entries = Vec::new();
            for row in rows {
                entries.push(row.map_err(sql_err("Row error"))?);
            }
            Ok(entries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_audit_log_newest_first() {
        let db = Database::in_memory().unwrap();
        let first = db.log_action(&AuditRecord::action("login")).unwrap();
        let second =
            db.log_action(&AuditRecord::action("create_project").on("project", 3)).unwrap();

        let log = db.get_audit_log(&AuditFilter::default()).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, second);
        assert_eq!(log[0].resource_type.as_deref(), Some("project"));
        assert_eq!(log[0].resource_id, Some(3));
        assert_eq!(log[1].id, first);
    }

    #[test]
    fn test_db_audit_log_filters_and_limit() {
        let db = Database::in_memory().unwrap();
        for i in 0..5 {
            db.log_action(&AuditRecord::action("update_setting").on("setting", i)).unwrap();
        }
        db.log_action(&AuditRecord {
            user_id: Some(1),
            ip_address: Some("127.0.0.1".into()),
            details: Some("interactive".into()),
            ..AuditRecord::action("login")
        })
        .unwrap();

        let logins = db
            .get_audit_log(&AuditFilter { action: Some("login".into()), ..Default::default() })
            .unwrap();
        assert_eq!(logins.len(), 1);
        assert_eq!(logins[0].user_id, Some(1));
        assert_eq!(logins[0].details.as_deref(), Some("interactive"));

        let settings = db
            .get_audit_log(&AuditFilter {
                resource_type: Some("setting".into()),
                limit: 3,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.len(), 3);
        assert_eq!(settings[0].resource_id, Some(4));
    }

    #[test]
    fn test_db_audit_requires_action() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(
            db.log_action(&AuditRecord::default()).unwrap_err(),
            HexstrikeError::InvalidInput(_)
        ));
    }
}
