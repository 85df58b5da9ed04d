use super::types::HexstrikeError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub retryable: bool,
}

impl HexstrikeError {
    /// Classify this error to determine its type and whether the caller may retry.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Another writer held the lock; the statement itself was fine.
            HexstrikeError::Busy(_) => ErrorClassification {
                error_type: "BusyError",
                retryable: true,
            },

            HexstrikeError::Connection(_) => ErrorClassification {
                error_type: "ConnectionFailure",
                retryable: false,
            },
            HexstrikeError::Constraint(_) => ErrorClassification {
                error_type: "ConstraintViolation",
                retryable: false,
            },
            HexstrikeError::Database(_) => ErrorClassification {
                error_type: "DatabaseError",
                retryable: false,
            },
            HexstrikeError::InvalidInput(_) => ErrorClassification {
                error_type: "InvalidInputError",
                retryable: false,
            },
            HexstrikeError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                retryable: false,
            },
            HexstrikeError::Io(_) => ErrorClassification {
                error_type: "IoError",
                retryable: false,
            },
            HexstrikeError::Json(_) | HexstrikeError::Yaml(_) => ErrorClassification {
                error_type: "SerializationError",
                retryable: false,
            },
        }
    }

    /// Process exit code used by the management CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            HexstrikeError::Config(_) | HexstrikeError::Yaml(_) => 2,
            HexstrikeError::Connection(_) => 3,
            HexstrikeError::Constraint(_) => 4,
            HexstrikeError::InvalidInput(_) => 5,
            _ => 1,
        }
    }
}
