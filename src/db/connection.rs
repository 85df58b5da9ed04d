use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};
use crate::errors::{sql_err, HexstrikeError};
use super::schema::{self, InitOutcome};

/// File name used when no explicit store path is configured.
pub const DEFAULT_DB_FILE: &str = "hexstrike_data.db";

/// Handle to the embedded store.
///
/// Cloning is cheap and every clone shares the same connection. Each public
/// operation runs in its own transaction: it commits on success and rolls back
/// entirely on any error, so partial writes are never observable.
pub struct Database {
    pub(crate) conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (creating if needed) the store at `path` and bring its schema up
    /// to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HexstrikeError> {
        Self::open_with_outcome(path).map(|(db, _)| db)
    }

    /// Like [`Database::open`], also reporting what schema initialization did.
    pub fn open_with_outcome(
        path: impl AsRef<Path>,
    ) -> Result<(Self, InitOutcome), HexstrikeError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HexstrikeError::Connection(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            HexstrikeError::Connection(format!("Failed to open database {}: {}", path.display(), e))
        })?;

        // References between tables are advisory; nothing cascades.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=OFF;")
            .map_err(|e| HexstrikeError::Connection(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        };
        let outcome = db.initialize()?;
        info!(path = %path.display(), "Database initialized");
        Ok((db, outcome))
    }

    pub fn in_memory() -> Result<Self, HexstrikeError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            HexstrikeError::Connection(format!("Failed to open in-memory db: {}", e))
        })?;
        conn.execute_batch("PRAGMA foreign_keys=OFF;")
            .map_err(|e| HexstrikeError::Connection(format!("Failed to set pragmas: {}", e)))?;
        let db = Self { conn: Arc::new(Mutex::new(conn)), path: None };
        db.initialize()?;
        Ok(db)
    }

    /// Run the schema manager. Safe to call any number of times; only the
    /// first call against an out-of-date store changes anything.
    pub fn initialize(&self) -> Result<InitOutcome, HexstrikeError> {
        let mut conn = self.lock()?;
        schema::initialize(&mut conn)
    }

    /// Filesystem location of the store, `None` when in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, HexstrikeError> {
        self.conn
            .lock()
            .map_err(|_| HexstrikeError::Connection("Connection mutex poisoned".into()))
    }

    /// Run `f` inside a transaction on the shared connection.
    pub(crate) fn with_tx<T, F>(&self, f: F) -> Result<T, HexstrikeError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, HexstrikeError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sql_err("Failed to begin transaction"))?;
        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(sql_err("Failed to commit transaction"))?;
                Ok(value)
            }
            Err(e) => {
                // Dropping the transaction rolls it back.
                error!(error = %e, "Database error, transaction rolled back");
                Err(e)
            }
        }
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self { conn: self.conn.clone(), path: self.path.clone() }
    }
}

/// Default store location: beside the running executable, falling back to the
/// working directory when the executable path cannot be resolved.
pub fn default_db_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DB_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

/// SQLite's own `CURRENT_TIMESTAMP` layout, extended with microseconds, so
/// rows stamped by column defaults and by the store sort together.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub(crate) fn format_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current UTC time for every timestamp column.
pub(crate) fn now() -> String {
    format_timestamp(chrono::Utc::now())
}
