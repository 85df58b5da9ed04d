use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::backup::Backup;
use rusqlite::Connection;
use tracing::{info, warn};
use crate::errors::{sql_err, HexstrikeError};
use crate::models::{DatabaseStats, Table};
use super::schema::{self, CURRENT_SCHEMA_VERSION};
use super::Database;

impl Database {
    /// Highest schema version recorded in the store.
    pub fn schema_version(&self) -> Result<i64, HexstrikeError> {
        let conn = self.lock()?;
        schema::stored_version(&conn)
    }

    /// Row counts for every managed table plus the on-disk size of the store.
    pub fn get_database_stats(&self) -> Result<DatabaseStats, HexstrikeError> {
        let conn = self.lock()?;
        let mut table_counts = BTreeMap::new();
        for table in Table::ALL {
            table_counts.insert(table, count_table(&conn, table)?);
        }
        let schema_version = schema::stored_version(&conn)?;
        drop(conn);

        let database_size_bytes = self
            .path()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(DatabaseStats {
            database_path: self.path().map(|p| p.display().to_string()),
            database_size_bytes,
            schema_version,
            current_schema_version: CURRENT_SCHEMA_VERSION,
            table_counts,
        })
    }

    pub fn count_rows(&self, table: Table) -> Result<i64, HexstrikeError> {
        let conn = self.lock()?;
        count_table(&conn, table)
    }

    /// Row count for a table given by name. Names outside the managed set
    /// report 0 without touching the database.
    pub fn count_rows_by_name(&self, name: &str) -> Result<i64, HexstrikeError> {
        match Table::from_name(name) {
            Some(table) => self.count_rows(table),
            None => {
                warn!(table = name, "Row count requested for unknown table");
                Ok(0)
            }
        }
    }

    /// Rebuild the store file, reclaiming free pages. Contents are unchanged.
    pub fn vacuum(&self) -> Result<(), HexstrikeError> {
        let conn = self.lock()?;
        conn.execute_batch("VACUUM").map_err(sql_err("Vacuum failed"))?;
        info!("Database vacuumed");
        Ok(())
    }

    /// Copy the store to `destination`, or to a timestamped sibling of the
    /// store file when none is given. Returns the path written.
    pub fn backup(&self, destination: Option<&Path>) -> Result<PathBuf, HexstrikeError> {
        let conn = self.lock()?;
        let dest = match (destination, self.path()) {
            (Some(dest), _) => dest.to_path_buf(),
            (None, Some(source)) => default_backup_path(source),
            (None, None) => {
                return Err(HexstrikeError::InvalidInput(
                    "Backup destination is required for an in-memory database".into(),
                ))
            }
        };

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        if let Some(source) = self.path() {
            if resolve_path(source)? == resolve_path(&dest)? {
                return Err(HexstrikeError::InvalidInput(format!(
                    "Backup destination {} is the database itself",
                    dest.display()
                )));
            }
        }

        match self.path() {
            Some(source) => {
                // Fold the WAL into the main file so the copy is complete.
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                    .map_err(sql_err("Checkpoint before backup failed"))?;
                std::fs::copy(source, &dest)?;
            }
            None => {
                let mut target = Connection::open(&dest).map_err(|e| {
                    HexstrikeError::Connection(format!(
                        "Failed to open backup {}: {}",
                        dest.display(),
                        e
                    ))
                })?;
                let backup = Backup::new(&conn, &mut target).map_err(sql_err("Backup failed"))?;
                backup
                    .run_to_completion(100, Duration::from_millis(10), None)
                    .map_err(sql_err("Backup failed"))?;
            }
        }

        info!(destination = %dest.display(), "Database backed up");
        Ok(dest)
    }
}

/// Row count for `table`; a table missing from the store counts as empty.
fn count_table(conn: &Connection, table: Table) -> Result<i64, HexstrikeError> {
    match conn.query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |row| row.get(0)) {
        Ok(count) => Ok(count),
        Err(rusqlite::Error::SqliteFailure(_, Some(msg))) if msg.starts_with("no such table") => {
            warn!(table = %table, "Counting rows of a missing table");
            Ok(0)
        }
        Err(e) => Err(sql_err("Failed to count rows")(e)),
    }
}

/// Absolute, symlink-free form of `path`. A file that does not exist yet is
/// resolved through its parent directory.
fn resolve_path(path: &Path) -> std::io::Result<PathBuf> {
    if path.exists() {
        return path.canonicalize();
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.canonicalize()?,
        _ => std::env::current_dir()?,
    };
    Ok(match path.file_name() {
        Some(name) => parent.join(name),
        None => parent,
    })
}

/// `<source>.backup_<YYYYmmdd_HHMMSS>`, beside the source file.
pub fn default_backup_path(source: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let mut name = source.as_os_str().to_owned();
    name.push(format!(".backup_{}", stamp));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DEFAULT_SETTINGS;
    use crate::models::{AuditRecord, NewProject};

    #[test]
    fn test_fresh_store_stats() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_database_stats().unwrap();

        assert_eq!(stats.database_path, None);
        assert_eq!(stats.database_size_bytes, 0);
        assert_eq!(stats.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(stats.count(Table::Settings), DEFAULT_SETTINGS.len() as i64);
        assert_eq!(stats.count(Table::SchemaVersion), 1);
        let entity_tables =
            [Table::Users, Table::Projects, Table::Scans, Table::Vulnerabilities, Table::AuditLog];
        for table in entity_tables {
            assert_eq!(stats.count(table), 0);
        }
        assert_eq!(stats.table_counts.len(), Table::ALL.len());
    }

    #[test]
    fn test_count_rows_by_name() {
        let db = Database::in_memory().unwrap();
        db.create_project(&NewProject::named("p")).unwrap();
        assert_eq!(db.count_rows_by_name("projects").unwrap(), 1);
        assert_eq!(db.count_rows_by_name("sqlite_master").unwrap(), 0);
        assert_eq!(db.count_rows_by_name("projects; DROP TABLE projects").unwrap(), 0);
        assert_eq!(db.count_rows(Table::Projects).unwrap(), 1);
    }

    #[test]
    fn test_count_missing_table_is_zero() {
        let db = Database::in_memory().unwrap();
        db.lock().unwrap().execute_batch("DROP TABLE audit_log").unwrap();
        assert_eq!(db.count_rows(Table::AuditLog).unwrap(), 0);
    }

    #[test]
    fn test_count_failure_is_reported() {
        let db = Database::in_memory().unwrap();
        db.lock()
            .unwrap()
            .execute_batch(
                "DROP TABLE projects;
                 CREATE VIEW projects AS SELECT 1 AS id WHERE abs(-9223372036854775807 - 1) > 0;",
            )
            .unwrap();
        assert!(db.count_rows(Table::Projects).is_err());
        assert!(db.get_database_stats().is_err());
    }

    #[test]
    fn test_vacuum_preserves_contents() {
        let db = Database::in_memory().unwrap();
        db.log_action(&AuditRecord::action("keep")).unwrap();
        db.vacuum().unwrap();
        assert_eq!(db.count_rows(Table::AuditLog).unwrap(), 1);
    }

    #[test]
    fn test_in_memory_backup_requires_destination() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(db.backup(None).unwrap_err(), HexstrikeError::InvalidInput(_)));
    }

    #[test]
    fn test_in_memory_backup_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::in_memory().unwrap();
        db.create_project(&NewProject::named("snapshot me")).unwrap();

        let dest = dir.path().join("mem.bak");
        assert_eq!(db.backup(Some(&dest)).unwrap(), dest);

        let restored = Database::open(&dest).unwrap();
        assert_eq!(restored.count_rows(Table::Projects).unwrap(), 1);
    }

    #[test]
    fn test_backup_onto_itself_by_another_spelling() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("store.db");
        let db = Database::open(&path).unwrap();
        db.create_project(&NewProject::named("keep me")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        for dest in [path.clone(), dir.path().join("sub").join("..").join("store.db")] {
            let err = db.backup(Some(&dest)).unwrap_err();
            assert!(matches!(err, HexstrikeError::InvalidInput(_)), "{}", dest.display());
        }
        assert_eq!(db.count_rows(Table::Projects).unwrap(), 1);
        drop(db);
        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.count_rows(Table::Projects).unwrap(), 1);
    }

    #[test]
    fn test_default_backup_path_is_sibling() {
        let p = default_backup_path(Path::new("/data/hexstrike_data.db"));
        let name = p.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("hexstrike_data.db.backup_"));
        assert_eq!(name.len(), "hexstrike_data.db.backup_".len() + "20240101_000000".len());
        assert_eq!(p.parent(), Some(Path::new("/data")));
    }
}
