//! Error types for ossfs-core
//!
//! Two layers of errors live here. [`Error`] is the detailed error produced by
//! backend clients, configuration loading and the driver registry.
//! [`OperationFailed`] is the only failure the filesystem facade hands to its
//! callers: backend detail is logged where it is collapsed and never crosses
//! the facade boundary.

use thiserror::Error;

/// Result type alias for ossfs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type of every filesystem facade operation
pub type FsResult<T> = std::result::Result<T, OperationFailed>;

/// Error types for ossfs-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Disk not found in the configuration
    #[error("Disk not found: {0}")]
    DiskNotFound(String),

    /// Disk already exists
    #[error("Disk already exists: {0}")]
    DiskExists(String),

    /// No driver registered under this name
    #[error("Driver not registered: {0}")]
    DriverNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication or permission error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether this error reports a missing object or bucket
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// The storage backend failed to carry out an operation.
///
/// Authentication, network, not-found and permission failures all collapse
/// into this one value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("storage backend operation failed")]
pub struct OperationFailed;

/// Collapse a backend error into [`OperationFailed`], logging the detail.
pub(crate) fn collapse(operation: &'static str, key: &str, err: Error) -> OperationFailed {
    tracing::debug!(operation, key, error = %err, "backend operation failed");
    OperationFailed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DiskNotFound("uploads".into());
        assert_eq!(err.to_string(), "Disk not found: uploads");

        let err = Error::InvalidPath("/bad/path".into());
        assert_eq!(err.to_string(), "Invalid path: /bad/path");
    }

    #[test]
    fn test_not_found_detection() {
        assert!(Error::NotFound("a.txt".into()).is_not_found());
        assert!(!Error::Network("reset".into()).is_not_found());
    }

    #[test]
    fn test_collapse_discards_detail() {
        let failed = collapse("read", "a.txt", Error::Auth("InvalidAccessKeyId".into()));
        assert_eq!(failed, OperationFailed);
        assert_eq!(failed.to_string(), "storage backend operation failed");
    }
}
