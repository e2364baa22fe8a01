//! Error types for the persistence layer

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while saving or loading an engine document
#[derive(Error, Debug)]
pub enum StorageError {
    /// The document could not be parsed as a persisted engine document
    #[error("malformed persisted document: {reason}")]
    InvalidFormat {
        /// Reason the document failed to parse
        reason: String,
    },

    /// The document's version string does not match a version this crate can load
    #[error("unsupported document version: {found}, expected {expected}")]
    VersionMismatch {
        /// Version found in the document
        found: String,
        /// Version this crate produces and accepts
        expected: String,
    },

    /// Underlying JSON (de)serialization failure
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        /// Source JSON error
        source: serde_json::Error,
    },

    /// I/O failure while reading or writing the document sink/source
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error
        source: std::io::Error,
    },
}

impl StorageError {
    /// Create an invalid format error
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }

    /// Create a version mismatch error
    pub fn version_mismatch(found: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::VersionMismatch {
            found: found.into(),
            expected: expected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StorageError::invalid_format("missing words array");
        assert!(matches!(err, StorageError::InvalidFormat { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::version_mismatch("0.9", "1");
        let msg = format!("{}", err);
        assert!(msg.contains("unsupported document version"));
    }
}
