//! Error types for QDPS.
//!
//! Uses `thiserror` for ergonomic error definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the scan pipeline.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("no candidate addresses to scan")]
    NoCandidates,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("result artifact error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors raised while reading or writing the result artifact.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to write results to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("failed to read results from {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("directory error: {0}")]
    DirectoryError(String),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while locating or loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a home directory for configuration")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Port(#[from] crate::types::PortError),

    #[error("operation canceled by user")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI handlers.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_names_path() {
        let err = StorageError::WriteFailed {
            path: PathBuf::from("/tmp/scan.results"),
            reason: "read-only file system".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/scan.results"));
        assert!(msg.contains("read-only"));
    }

    #[test]
    fn test_cli_error_wraps_storage_transparently() {
        let err: CliError = StorageError::DirectoryError("gone".to_string()).into();
        assert_eq!(err.to_string(), "directory error: gone");
    }
}
