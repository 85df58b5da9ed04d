use serde::{Deserialize, Serialize};

/// Severity level for a vulnerability, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Lower values indicate higher severity.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    pub fn from_db(s: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(s.to_lowercase())).unwrap_or_default()
    }
}

/// Triage state of a vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityStatus {
    #[default]
    New,
    Confirmed,
    FalsePositive,
    Remediated,
}

impl VulnerabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Confirmed => "confirmed",
            Self::FalsePositive => "false_positive",
            Self::Remediated => "remediated",
        }
    }

    pub fn from_db(s: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(s.to_string())).unwrap_or_default()
    }

    /// Every status except `New` records when a human verified it.
    pub fn requires_verification(&self) -> bool {
        matches!(self, Self::Confirmed | Self::FalsePositive | Self::Remediated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: i64,
    pub scan_id: Option<i64>,
    pub project_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub cvss_score: Option<f64>,
    pub cve_id: Option<String>,
    pub cwe_id: Option<String>,
    pub location: Option<String>,
    pub proof_of_concept: Option<String>,
    pub remediation: Option<String>,
    pub status: VulnerabilityStatus,
    /// Tool or agent that reported the issue (e.g. "nuclei", "sqlmap").
    pub discovered_by: Option<String>,
    pub discovered_at: String,
    /// Set iff `status.requires_verification()`.
    pub verified_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewVulnerability {
    pub scan_id: Option<i64>,
    pub project_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub cvss_score: Option<f64>,
    pub cve_id: Option<String>,
    pub cwe_id: Option<String>,
    pub location: Option<String>,
    pub proof_of_concept: Option<String>,
    pub remediation: Option<String>,
    pub discovered_by: Option<String>,
}

/// Equality filters combined with AND. `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct VulnerabilityFilter {
    pub project_id: Option<i64>,
    pub scan_id: Option<i64>,
    pub severity: Option<Severity>,
    pub status: Option<VulnerabilityStatus>,
}
