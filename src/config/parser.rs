use std::path::Path;
use crate::errors::HexstrikeError;
use super::types::HexstrikeConfig;
use super::security::validate_security_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub fn parse_config(path: &Path) -> Result<HexstrikeConfig, HexstrikeError> {
    if !path.exists() {
        return Err(HexstrikeError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = std::fs::metadata(path)?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(HexstrikeError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<HexstrikeConfig, HexstrikeError> {
    // An empty document is a valid, empty config.
    if content.trim().is_empty() {
        return Ok(HexstrikeConfig::default());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    if yaml.is_null() {
        return Ok(HexstrikeConfig::default());
    }

    validate_security_patterns(&yaml)?;
    validate_schema(&yaml)?;

    let config: HexstrikeConfig = serde_yaml::from_value(yaml)?;
    validate_conflicts(&config)?;
    Ok(config)
}

/// Structural check against the JSON schema. Violations are logged, not fatal.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), HexstrikeError> {
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| HexstrikeError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| HexstrikeError::Config(format!("Schema compilation error: {}", e)))?;

    if let Err(errors) = compiled.validate(&json_value) {
        for e in errors {
            warn!(
                validation_error = %format!("{} at {}", e, e.instance_path),
                "Config schema warning"
            );
        }
    }
    Ok(())
}

fn validate_conflicts(config: &HexstrikeConfig) -> Result<(), HexstrikeError> {
    if let (Some(db), Some(dir)) = (config.database_path(), config.backup_directory()) {
        if db == dir {
            return Err(HexstrikeError::Config(format!(
                "Backup directory '{}' is the database file itself",
                dir.display()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config_str(
            "database:\n  path: /var/lib/hexstrike/data.db\n\
             logging:\n  level: debug\n  format: json\n\
             backup:\n  directory: /var/backups/hexstrike\n",
        )
        .unwrap();
        assert_eq!(config.database_path().unwrap().to_str(), Some("/var/lib/hexstrike/data.db"));
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.log_level(), Some("debug"));
        assert!(config.backup_directory().is_some());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = parse_config_str("").unwrap();
        assert!(config.database.is_none());
    }

    #[test]
    fn test_unknown_keys_only_warn() {
        let config = parse_config_str("database:\n  path: store.db\nextra: 1\n").unwrap();
        assert!(config.database_path().is_some());
    }

    #[test]
    fn test_dangerous_path_rejected() {
        let err = parse_config_str("database:\n  path: ../outside.db\n").unwrap_err();
        assert!(matches!(err, HexstrikeError::Config(_)));
    }

    #[test]
    fn test_backup_directory_conflict() {
        let content = "database:\n  path: /srv/x.db\nbackup:\n  directory: /srv/x.db\n";
        let err = parse_config_str(content).unwrap_err();
        assert!(matches!(err, HexstrikeError::Config(_)));
    }

    #[test]
    fn test_bad_format_is_type_error() {
        assert!(parse_config_str("logging:\n  format: xml\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = parse_config(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, HexstrikeError::Config(_)));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("big.yaml");
        std::fs::write(&path, "#".repeat(MAX_CONFIG_BYTES as usize + 1)).unwrap();
        let err = parse_config(&path).unwrap_err();
        assert!(err.to_string().contains("1MB"));
    }

    #[test]
    fn test_parse_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hexstrike.yaml");
        std::fs::write(&path, "logging:\n  level: warn\n").unwrap();
        assert_eq!(parse_config(&path).unwrap().log_level(), Some("warn"));
    }
}
