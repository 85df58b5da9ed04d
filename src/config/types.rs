use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HexstrikeConfig {
    pub database: Option<DatabaseConfig>,
    pub logging: Option<LoggingConfig>,
    pub backup: Option<BackupConfig>,
}

impl HexstrikeConfig {
    pub fn database_path(&self) -> Option<&PathBuf> {
        self.database.as_ref().and_then(|d| d.path.as_ref())
    }

    pub fn backup_directory(&self) -> Option<&PathBuf> {
        self.backup.as_ref().and_then(|b| b.directory.as_ref())
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging.as_ref().map(|l| l.format).unwrap_or_default()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `hexstrike=debug`.
    pub level: Option<String>,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BackupConfig {
    /// Where `backup` writes when no destination is given.
    pub directory: Option<PathBuf>,
}
