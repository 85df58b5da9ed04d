use rusqlite::OptionalExtension;
use tracing::info;
use crate::errors::{sql_err, HexstrikeError};
use crate::models::{
    NewVulnerability, Severity, Vulnerability, VulnerabilityFilter, VulnerabilityStatus,
};
use super::connection::now;
use super::Database;

const VULN_COLUMNS: &str = "id, scan_id, project_id, title, description, severity, cvss_score, \
                            cve_id, cwe_id, location, proof_of_concept, remediation, status, \
                            discovered_by, discovered_at, verified_at";

impl Database {
    /// Record a newly discovered vulnerability in status `new`.
    pub fn add_vulnerability(&self, vuln: &NewVulnerability) -> Result<i64, HexstrikeError> {
        if vuln.title.trim().is_empty() {
            return Err(HexstrikeError::InvalidInput("Vulnerability title is required".into()));
        }
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO vulnerabilities
                    (scan_id, project_id, title, description, severity, cvss_score, cve_id, cwe_id,
                     location, proof_of_concept, remediation, status, discovered_by, discovered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                rusqlite::params![
                    vuln.scan_id,
                    vuln.project_id,
                    vuln.title,
                    vuln.description,
                    vuln.severity.as_str(),
                    vuln.cvss_score,
                    vuln.cve_id,
                    vuln.cwe_id,
                    vuln.location,
                    vuln.proof_of_concept,
                    vuln.remediation,
                    VulnerabilityStatus::New.as_str(),
                    vuln.discovered_by,
                    now(),
                ],
            )
            .map_err(sql_err("Failed to insert vulnerability"))?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn get_vulnerability(&self, id: i64) -> Result<Option<Vulnerability>, HexstrikeError> {
        self.with_tx(|tx| {
            tx.query_row(
                &format!("SELECT {} FROM vulnerabilities WHERE id = ?1", VULN_COLUMNS),
                rusqlite::params![id],
                read_vuln_row,
            )
            .optional()
            .map_err(sql_err("Failed to read vulnerability"))
        })
    }

    /// Vulnerabilities matching every supplied filter, most severe first
    /// (`cvss_score` descending, unscored last), then most recently discovered.
    pub fn get_vulnerabilities(
        &self,
        filter: &VulnerabilityFilter,
    ) -> Result<Vec<Vulnerability>, HexstrikeError> {
        self.with_tx(|tx| {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {} FROM vulnerabilities
                     WHERE (?1 IS NULL OR project_id = ?1)
                       AND (?2 IS NULL OR scan_id = ?2)
                       AND (?3 IS NULL OR severity = ?3)
                       AND (?4 IS NULL OR status = ?4)
                     ORDER BY cvss_score DESC, julianday(discovered_at) DESC, id DESC",
                    VULN_COLUMNS
                ))
                .map_err(sql_err("Query failed"))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![
                        filter.project_id,
                        filter.scan_id,
                        filter.severity.map(|s| s.as_str()),
                        filter.status.map(|s| s.as_str()),
                    ],
                    read_vuln_row,
                )
                .map_err(sql_err("Query error"))?;

            let mut vulns = Vec::new();
            for row in rows {
                vulns.push(row.map_err(sql_err("Row error"))?);
            }
            Ok(vulns)
        })
    }

    /// Move a vulnerability to `status`. `verified_at` is stamped for every
    /// status except `new`, and cleared when returning to `new`.
    pub fn update_vulnerability_status(
        &self,
        id: i64,
        status: VulnerabilityStatus,
    ) -> Result<bool, HexstrikeError> {
        let verified_at = status.requires_verification().then(now);
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE vulnerabilities SET status = ?2, verified_at = ?3 WHERE id = ?1",
                    rusqlite::params![id, status.as_str(), verified_at],
                )
                .map_err(sql_err("Failed to update vulnerability status"))?;
            if affected > 0 {
                info!(vuln_id = id, status = status.as_str(), "Vulnerability status updated");
            }
            Ok(affected > 0)
        })
    }

    pub fn update_vulnerability_remediation(
        &self,
        id: i64,
        remediation: &str,
    ) -> Result<bool, HexstrikeError> {
        self.with_tx(|tx| {
            let affected = tx
                .execute(
                    "UPDATE vulnerabilities SET remediation = ?2 WHERE id = ?1",
                    rusqlite::params![id, remediation],
                )
                .map_err(sql_err("Failed to update remediation"))?;
            Ok(affected > 0)
        })
    }
}

fn read_vuln_row(row: &rusqlite::Row) -> rusqlite::Result<Vulnerability> {
    let severity: Option<String> = row.get(5)?;
    let status: Option<String> = row.get(12)?;

    Ok(Vulnerability {
        id: row.get(0)?,
        scan_id: row.get(1)?,
        project_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        severity: severity.as_deref().map(Severity::from_db).unwrap_or_default(),
        cvss_score: row.get(6)?,
        cve_id: row.get(7)?,
        cwe_id: row.get(8)?,
        location: row.get(9)?,
        proof_of_concept: row.get(10)?,
        remediation: row.get(11)?,
        status: status.as_deref().map(VulnerabilityStatus::from_db).unwrap_or_default(),
        discovered_by: row.get(13)?,
        discovered_at: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
        verified_at: row.get(15)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_vuln(title: &str, severity: Severity, cvss: Option<f64>) -> NewVulnerability {
        NewVulnerability {
            scan_id: Some(1),
            project_id: Some(1),
            title: title.to_string(),
            severity,
            cvss_score: cvss,
            cwe_id: Some("CWE-89".to_string()),
            location: Some("/api/users?id=".to_string()),
            discovered_by: Some("sqlmap".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_db_add_and_get_vulnerability() {
        let db = Database::in_memory().unwrap();
        let id = db
            .add_vulnerability(&make_vuln("SQLi in /api/users", Severity::Critical, Some(9.8)))
            .unwrap();

        let v = db.get_vulnerability(id).unwrap().unwrap();
        assert_eq!(v.title, "SQLi in /api/users");
        assert_eq!(v.severity, Severity::Critical);
        assert_eq!(v.cvss_score, Some(9.8));
        assert_eq!(v.status, VulnerabilityStatus::New);
        assert!(v.verified_at.is_none());
        assert_eq!(v.discovered_by.as_deref(), Some("sqlmap"));
    }

    #[test]
    fn test_db_default_severity_is_medium() {
        let db = Database::in_memory().unwrap();
        let banner = NewVulnerability { title: "Verbose banner".into(), ..Default::default() };
        let id = db.add_vulnerability(&banner).unwrap();
        assert_eq!(db.get_vulnerability(id).unwrap().unwrap().severity, Severity::Medium);
    }

    #[test]
    fn test_db_vulnerability_requires_title() {
        let db = Database::in_memory().unwrap();
        let err = db.add_vulnerability(&NewVulnerability::default()).unwrap_err();
        assert!(matches!(err, HexstrikeError::InvalidInput(_)));
    }

    #[test]
    fn test_db_status_transition_derives_verified_at() {
        let db = Database::in_memory().unwrap();
        let id = db.add_vulnerability(&make_vuln("XSS", Severity::High, Some(6.1))).unwrap();

        assert!(db.update_vulnerability_status(id, VulnerabilityStatus::Confirmed).unwrap());
        let v = db.get_vulnerability(id).unwrap().unwrap();
        assert_eq!(v.status, VulnerabilityStatus::Confirmed);
        assert!(v.verified_at.is_some());

        assert!(db.update_vulnerability_status(id, VulnerabilityStatus::New).unwrap());
        let v = db.get_vulnerability(id).unwrap().unwrap();
        assert_eq!(v.status, VulnerabilityStatus::New);
        assert!(v.verified_at.is_none());

        for status in [VulnerabilityStatus::FalsePositive, VulnerabilityStatus::Remediated] {
            db.update_vulnerability_status(id, status).unwrap();
            assert!(db.get_vulnerability(id).unwrap().unwrap().verified_at.is_some());
        }
    }

    #[test]
    fn test_db_status_update_missing_vulnerability() {
        let db = Database::in_memory().unwrap();
        assert!(!db.update_vulnerability_status(7, VulnerabilityStatus::Confirmed).unwrap());
    }

    #[test]
    fn test_db_vulnerabilities_ordered_by_score_then_recency() {
        let db = Database::in_memory().unwrap();
        let add = |title: &str, severity: Severity, score: Option<f64>| {
            db.add_vulnerability(&make_vuln(title, severity, score)).unwrap()
        };
        let first_98 = add("A", Severity::Critical, Some(9.8));
        let mid = add("B", Severity::High, Some(7.2));
        let second_98 = add("C", Severity::Critical, Some(9.8));
        let unscored = add("D", Severity::Info, None);

        let ids: Vec<i64> = db
            .get_vulnerabilities(&VulnerabilityFilter::default())
            .unwrap()
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![second_98, first_98, mid, unscored]);
    }

    #[test]
    fn test_db_vulnerability_filters_combine() {
        let db = Database::in_memory().unwrap();
        let add = |scan: i64, project: i64, title: &str, severity: Severity, score: f64| {
            db.add_vulnerability(&NewVulnerability {
                scan_id: Some(scan),
                project_id: Some(project),
                ..make_vuln(title, severity, Some(score))
            })
            .unwrap()
        };
        add(1, 10, "a", Severity::High, 8.0);
        add(2, 10, "b", Severity::High, 7.5);
        let low = add(2, 10, "c", Severity::Low, 3.1);
        add(3, 11, "d", Severity::High, 8.8);

        let by_project = db
            .get_vulnerabilities(&VulnerabilityFilter {
                project_id: Some(10),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_project.len(), 3);

        let by_scan_and_severity = db
            .get_vulnerabilities(&VulnerabilityFilter {
                scan_id: Some(2),
                severity: Some(Severity::High),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_scan_and_severity.len(), 1);
        assert_eq!(by_scan_and_severity[0].title, "b");

        db.update_vulnerability_status(low, VulnerabilityStatus::Remediated).unwrap();
        let remediated = db
            .get_vulnerabilities(&VulnerabilityFilter {
                status: Some(VulnerabilityStatus::Remediated),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(remediated.len(), 1);
        assert_eq!(remediated[0].id, low);
    }

    #[test]
    fn test_db_update_remediation() {
        let db = Database::in_memory().unwrap();
        let id = db.add_vulnerability(&make_vuln("SQLi", Severity::Critical, Some(9.1))).unwrap();
        assert!(db.update_vulnerability_remediation(id, "Use parameterized queries").unwrap());
        assert_eq!(
            db.get_vulnerability(id).unwrap().unwrap().remediation.as_deref(),
            Some("Use parameterized queries")
        );
    }
}
