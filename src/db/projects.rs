use rusqlite::OptionalExtension;
use crate::errors::{sql_err, HexstrikeError};
use crate::models::{NewProject, NewTarget, Project, ProjectStatus, Target, TargetStatus};
use super::codec;
use super::connection::now;
use super::Database;

const PROJECT_COLUMNS: &str =
    "id, name, description, client, status, settings, created_by, created_at, updated_at";
const TARGET_COLUMNS: &str = "id, project_id, target, target_type, status, metadata, created_at";

impl Database {
    pub fn create_project(&self, project: &NewProject) -> Result<i64, HexstrikeError> {
        if project.name.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput("Project name is required".into()));
        }
        self.with_tx(|tx| {
            let ts = now();
            tx.execute(
                "INSERT INTO projects
                    (name, description, client, status, created_by, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![
                    project.name,
                    project.description,
                    project.client,
                    ProjectStatus::Active.as_str(),
                    project.created_by,
                    ts
                ],
            )
            .map_err(sql_err("Failed to create project"))?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                rusqlite::params![id],
                read_project_row,
            )
            .optional()
            .map_err(sql_err("Failed to read project"))
        })
    }

    pub fn get_projects(
        &self,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, HexstrikeError> {
        self.with_tx(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {} FROM projects WHERE (?1 IS NULL OR status = ?1) ORDER BY id",
                    PROJECT_COLUMNS
                ))
                .map_err(sql_err("Query failed"))?;
            let rows = stmt
                .query_map(rusqlite::params![status.map(|s| s.as_str())], read_project_row)
                .map_err(sql_err("Query error"))?;

            let mut projects = Vec::new();
            for row in rows {
                projects.push(row.map_err(sql_err("Row error"))?);
            }
            Ok(projects)
        })
    }

    pub fn update_project_status(
        &self,
        id: i64,
        status: ProjectStatus,
    ) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE projects SET status = ?2, updated_at = ?3 WHERE id = ?1",
                    rusqlite::params![id, status.as_str(), now()],
                )
                .map_err(sql_err("Failed to update project"))?;
            Ok(affected > 0)
        })
    }

    /// Delete a project row. Targets, scans and vulnerabilities that reference
    /// it are left in place.
    pub fn delete_project(&self, id: i64) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute("DELETE FROM projects WHERE id = ?1", rusqlite::params![id])
                .map_err(sql_err("Delete failed"))?;
            Ok(affected > 0)
        })
    }

    pub fn create_target(&self, target: &NewTarget) -> Result<i64, HexstrikeError> {
        if target.target.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput("Target is required".into()));
        }
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO targets (project_id, target, target_type, status, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    target.project_id,
                    target.target,
                    target.target_type,
                    TargetStatus::Pending.as_str(),
                    codec::json_text(target.metadata.as_ref()),
                    now()
                ],
            )
            .map_err(sql_err("Failed to create target"))?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn get_target(&self, id: i64) -> Result<Option<Target>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!("SELECT {} FROM targets WHERE id = ?1", TARGET_COLUMNS),
                rusqlite::params![id],
                read_target_row,
            )
            .optional()
            .map_err(sql_err("Failed to read target"))
        })
    }

    pub fn get_targets(&self, project_id: Option<i64>) -> Result<Vec<Target>, HexstrikeError> {
        self.with_tx(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {} FROM targets WHERE (?1 IS NULL OR project_id = ?1) ORDER BY id",
                    TARGET_COLUMNS
                ))
                .map_err(sql_err("Query failed"))?;
            let rows = stmt
                .query_map(rusqlite::params![project_id], read_target_row)
                .map_err(sql_err("Query error"))?;

            let mut targets = Vec::new();
            for row in rows {
                targets.push(row.map_err(sql_err("Row error"))?);
            }
            Ok(targets)
        })
    }

    pub fn update_target_status(
        &self,
        id: i64,
        status: TargetStatus,
    ) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE targets SET status = ?2 WHERE id = ?1",
                    rusqlite::params![id, status.as_str()],
                )
                .map_err(sql_err("Failed to update target"))?;
            Ok(affected > 0)
        })
    }

    pub fn delete_target(&self, id: i64) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute("DELETE FROM targets WHERE id = ?1", rusqlite::params![id])
                .map_err(sql_err("Delete failed"))?;
            Ok(affected > 0)
        })
    }
}

fn read_project_row(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    let status: Option<String> = row.get(4)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        client: row.get(3)?,
        status: status.as_deref().map(ProjectStatus::from_db).unwrap_or_default(),
        settings: codec::json_or_empty(row.get(5)?),
        created_by: row.get(6)?,
        created_at: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
    })
}

fn read_target_row(row: &rusqlite::Row) -> rusqlite::Result<Target> {
    let status: Option<String> = row.get(4)?;
    Ok(Target {
        id: row.get(0)?,
        project_id: row.get(1)?,
        target: row.get(2)?,
        target_type: row.get(3)?,
        status: status.as_deref().map(TargetStatus::from_db).unwrap_or_default(),
        metadata: codec::json_or_empty(row.get(5)?),
        created_at: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}
