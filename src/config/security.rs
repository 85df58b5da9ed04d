use crate::errors::HexstrikeError;

const DANGEROUS_PATTERNS: &[&str] = &[
    "../",
    "..\\",
    "<script",
    "javascript:",
    "data:",
    "file:",
    "vbscript:",
];

/// Reject the whole document if any string value anywhere in it contains a
/// traversal sequence or an executable URI scheme.
pub fn validate_security_patterns(value: &serde_yaml::Value) -> Result<(), HexstrikeError> {
    check_value(value, &mut Vec::new())
}

fn check_value(value: &serde_yaml::Value, path: &mut Vec<String>) -> Result<(), HexstrikeError> {
    match value {
        serde_yaml::Value::String(s) => {
            let lower = s.to_lowercase();
            match DANGEROUS_PATTERNS.iter().find(|p| lower.contains(*p)) {
                Some(pattern) => {
                    let location = if path.is_empty() {
                        "root".to_string()
                    } else {
                        path.join(".")
                    };
                    Err(HexstrikeError::Config(format!(
                        "Dangerous pattern '{}' found at config path: {}",
                        pattern, location
                    )))
                }
                None => Ok(()),
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                path.push(k.as_str().unwrap_or("unknown").to_string());
                check_value(v, path)?;
                path.pop();
            }
            Ok(())
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                path.push(format!("[{}]", i));
                check_value(v, path)?;
                path.pop();
            }
            Ok(())
        }
        serde_yaml::Value::Tagged(tagged) => check_value(&tagged.value, path),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> serde_yaml::Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_safe_config_passes() {
        let config = yaml("database:\n  path: /var/lib/hexstrike/data.db");
        assert!(validate_security_patterns(&config).is_ok());
    }

    #[test]
    fn test_directory_traversal_blocked() {
        let config = yaml("database:\n  path: ../../etc/passwd");
        let err = validate_security_patterns(&config).unwrap_err();
        assert!(err.to_string().contains("database.path"));
    }

    #[test]
    fn test_windows_traversal_blocked() {
        let config = yaml("backup:\n  directory: '..\\\\backups'");
        assert!(validate_security_patterns(&config).is_err());
    }

    #[test]
    fn test_uri_schemes_blocked() {
        let values = [
            "'javascript:void(0)'",
            "'data:text/html,hi'",
            "'file:///etc/passwd'",
            "'VBScript:msgbox'",
        ];
        for v in values {
            assert!(validate_security_patterns(&yaml(&format!("value: {}", v))).is_err(), "{}", v);
        }
    }

    #[test]
    fn test_script_in_sequence_blocked() {
        let config = yaml("items:\n  - ok\n  - '<script>alert(1)'");
        assert!(validate_security_patterns(&config).is_err());
    }

    #[test]
    fn test_numeric_values_pass() {
        assert!(validate_security_patterns(&yaml("port: 8888\nenabled: true")).is_ok());
    }
}
