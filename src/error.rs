//! Custom error types for tenback
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for tenback operations
#[derive(Error, Debug)]
pub enum TenbackError {
    /// Configuration-related errors (missing or unparseable keys)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external tool exited nonzero or could not be started
    #[error("{step} failed: {detail}")]
    Process {
        step: &'static str,
        detail: String,
    },

    /// The target database appeared between drop and create
    #[error("Database already exists: {0}")]
    DatabaseExists(String),

    /// Filesystem errors (staging collision, copy/move failure)
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// PostgreSQL client errors
    #[error("Database error: {0}")]
    Database(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },
}

impl TenbackError {
    /// Create a "not found" error for backup artifacts
    pub fn artifact_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup artifact",
            identifier: identifier.into(),
        }
    }

    /// Create a process error for a named pipeline step
    pub fn process(step: &'static str, detail: impl Into<String>) -> Self {
        Self::Process {
            step,
            detail: detail.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for TenbackError {
    fn from(err: std::io::Error) -> Self {
        Self::Filesystem(err.to_string())
    }
}

impl From<serde_json::Error> for TenbackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<postgres::Error> for TenbackError {
    fn from(err: postgres::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for tenback operations
pub type TenbackResult<T> = Result<T, TenbackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TenbackError::Config("missing key db_name".into());
        assert_eq!(err.to_string(), "Configuration error: missing key db_name");
    }

    #[test]
    fn test_process_error_names_step() {
        let err = TenbackError::process("dump", "pg_dump exited with exit status: 1");
        assert_eq!(
            err.to_string(),
            "dump failed: pg_dump exited with exit status: 1"
        );
    }

    #[test]
    fn test_database_exists_error() {
        let err = TenbackError::DatabaseExists("acme".into());
        assert_eq!(err.to_string(), "Database already exists: acme");
    }

    #[test]
    fn test_not_found_error() {
        let err = TenbackError::artifact_not_found("missing.tar.zst");
        assert_eq!(
            err.to_string(),
            "Backup artifact not found: missing.tar.zst"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TenbackError = io_err.into();
        assert!(matches!(err, TenbackError::Filesystem(_)));
    }
}
