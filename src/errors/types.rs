use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HexstrikeError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl HexstrikeError {
    /// Convert a rusqlite failure into the matching error kind, prefixed with
    /// the operation that failed.
    pub fn from_sqlite(context: &str, err: rusqlite::Error) -> Self {
        let message = format!("{}: {}", context, err);
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::Constraint(message),
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => Self::Busy(message),
            Some(ErrorCode::CannotOpen)
            | Some(ErrorCode::NotADatabase)
            | Some(ErrorCode::ReadOnly)
            | Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::DatabaseCorrupt)
            | Some(ErrorCode::SystemIoFailure) => Self::Connection(message),
            _ => Self::Database(message),
        }
    }
}

/// `map_err` adapter: `.map_err(sql_err("Failed to create scan"))?`
pub(crate) fn sql_err(context: &'static str) -> impl FnOnce(rusqlite::Error) -> HexstrikeError {
    move |e| HexstrikeError::from_sqlite(context, e)
}
