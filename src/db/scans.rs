use rusqlite::OptionalExtension;
use tracing::debug;
use crate::errors::{sql_err, HexstrikeError};
use crate::models::{Scan, ScanStatus};
use super::codec;
use super::connection::now;
use super::Database;

const SCAN_COLUMNS: &str = "id, project_id, target_id, scan_type, status, progress, current_phase, \
                            tools_used, results, started_at, completed_at, created_at";

impl Database {
    /// Start a scan. It is created already `running` with `started_at` set.
    pub fn create_scan(
        &self,
        project_id: Option<i64>,
        target_id: Option<i64>,
        scan_type: &str,
    ) -> Result<i64, HexstrikeError> {
        if scan_type.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput("Scan type is required".into()));
        }
        self.with_tx(|tx| {
            let ts = now();
            tx.execute(
                "INSERT INTO scans
                    (project_id, target_id, scan_type, status, progress, started_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
                rusqlite::params![
                    project_id,
                    target_id,
                    scan_type,
                    ScanStatus::Running.as_str(),
                    ts
                ],
            )
            .map_err(sql_err("Failed to create scan"))?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn get_scan(&self, id: i64) -> Result<Option<Scan>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!("SELECT {} FROM scans WHERE id = ?1", SCAN_COLUMNS),
                rusqlite::params![id],
                read_scan_row,
            )
            .optional()
            .map_err(sql_err("Failed to read scan"))
        })
    }

    /// Record incremental progress. `current_phase` and `tools_used` keep their
    /// stored values when `None`. Progress is capped at 100.
    pub fn update_scan_progress(
        &self,
        id: i64,
        progress: u8,
        current_phase: Option<&str>,
        tools_used: Option<&[String]>,
    ) -> Result<bool, HexstrikeError> {
        let tools = tools_used.map(|t| serde_json::to_string(t)).transpose()?;
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE scans SET
                        progress = ?2,
                        current_phase = COALESCE(?3, current_phase),
                        tools_used = COALESCE(?4, tools_used)
                     WHERE id = ?1",
                    rusqlite::params![id, progress.min(100), current_phase, tools],
                )
                .map_err(sql_err("Failed to update scan progress"))?;
            debug!(scan_id = id, progress, "Scan progress updated");
            Ok(affected > 0)
        })
    }

    /// Terminate a scan: stores the final status and results, forces progress
    /// to 100 and stamps `completed_at`. Calling it again overwrites both.
    pub fn complete_scan(
        &self,
        id: i64,
        status: ScanStatus,
        results: Option<&serde_json::Value>,
    ) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE scans SET status = ?2, progress = 100, results = ?3, completed_at = ?4
                     WHERE id = ?1",
                    rusqlite::params![id, status.as_str(), codec::json_text(results), now()],
                )
                .map_err(sql_err("Failed to complete scan"))?;
            Ok(affected > 0)
        })
    }

    /// Most recent scans first, optionally for one project, at most `limit`.
    pub fn get_scan_history(
        &self,
        project_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<Scan>, HexstrikeError> {
        self.with_tx(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {} FROM scans WHERE (?1 IS NULL OR project_id = ?1)
                     ORDER BY julianday(created_at) DESC, id DESC LIMIT ?2",
                    SCAN_COLUMNS
                ))
                .map_err(sql_err("Query failed"))?;
            let rows = stmt
                .query_map(rusqlite::params![project_id, limit as i64], read_scan_row)
                .map_err(sql_err("Query error"))?;

            let mut results = Vec::new();
            for row in rows {
                results.push(row.map_err(sql_err("Row error"))?);
            }
            Ok(results)
        })
    }

    pub fn delete_scan(&self, id: i64) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute("DELETE FROM scans WHERE id = ?1", rusqlite::params![id])
                .map_err(sql_err("Delete failed"))?;
            Ok(affected > 0)
        })
    }
}

fn read_scan_row(row: &rusqlite::Row) -> rusqlite::Result<Scan> {
    let status: Option<String> = row.get(4)?;
    let progress: Option<i64> = row.get(5)?;
    let tools_used: Option<String> = row.get(7)?;
    let results: Option<String> = row.get(8)?;

    Ok(Scan {
        id: row.get(0)?,
        project_id: row.get(1)?,
        target_id: row.get(2)?,
        scan_type: row.get(3)?,
        status: status.as_deref().map(ScanStatus::from_db).unwrap_or_default(),
        progress: progress.unwrap_or(0).clamp(0, 100) as u8,
        current_phase: row.get(6)?,
        tools_used: tools_used
            .and_then(|t| serde_json::from_str(&t).ok())
            .unwrap_or_default(),
        results: results.and_then(|r| serde_json::from_str(&r).ok()),
        started_at: row.get(9)?,
        completed_at: row.get(10)?,
        created_at: row.get::<_, Option<String>>(11)?.unwrap_or_default(),
    })
}
