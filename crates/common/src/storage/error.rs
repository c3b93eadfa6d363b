//! Storage error types
//!
//! Defines error types for the SQLCipher layer and their classification.

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(String),

    #[error("Database encryption error: {0}")]
    Encryption(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Encryption key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Wrong encryption key or database not encrypted")]
    WrongKeyOrNotEncrypted,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Rusqlite(#[from] rusqlite::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorClassification for StorageError {
    /// Check if this error is retryable
    ///
    /// Only transient SQLite lock conditions qualify; the storage layer never
    /// retries by itself, this only informs callers.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Rusqlite(err) => {
                matches!(
                    err.sqlite_error_code(),
                    Some(rusqlite::ErrorCode::DatabaseBusy)
                        | Some(rusqlite::ErrorCode::DatabaseLocked)
                )
            }
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(_) => ErrorSeverity::Error,
            Self::Query(_) => ErrorSeverity::Error,
            Self::Encryption(_) => ErrorSeverity::Critical,
            Self::Keychain(_) => ErrorSeverity::Critical,
            Self::KeyUnavailable(_) => ErrorSeverity::Error,
            Self::WrongKeyOrNotEncrypted => ErrorSeverity::Critical,
            Self::InvalidConfig(_) => ErrorSeverity::Error,
            Self::Io(_) => ErrorSeverity::Error,
            Self::Rusqlite(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Encryption(_) | Self::Keychain(_) | Self::WrongKeyOrNotEncrypted)
    }

    fn retry_after(&self) -> Option<std::time::Duration> {
        None
    }
}

/// Returns true when a driver error message indicates the key does not match
/// the file (or the file is not an encrypted database at all).
pub(crate) fn is_wrong_key_message(message: &str) -> bool {
    let err_str = message.to_lowercase();
    err_str.contains("file is not a database")
        || err_str.contains("file is encrypted")
        || err_str.contains("database disk image is malformed")
        || err_str.contains("notadb")
        || err_str.contains("authentication failed")
        || err_str.contains("unsupported file format")
}

#[cfg(test)]
mod tests {
    //! Unit tests for storage::error.
    use super::*;

    /// Validates display strings for the variants surfaced to callers.
    ///
    /// Assertions:
    /// - Confirms `WrongKeyOrNotEncrypted` renders its fixed message.
    /// - Confirms `Query` prefixes its cause.
    #[test]
    fn test_error_display() {
        let err = StorageError::Connection("Failed to connect".to_string());
        assert_eq!(err.to_string(), "Database connection error: Failed to connect");

        let err = StorageError::WrongKeyOrNotEncrypted;
        assert_eq!(err.to_string(), "Wrong encryption key or database not encrypted");

        let err = StorageError::Query("no such table".to_string());
        assert_eq!(err.to_string(), "Database query error: no such table");
    }

    #[test]
    fn test_error_retryability() {
        assert!(!StorageError::InvalidConfig("test".to_string()).is_retryable());
        assert!(!StorageError::WrongKeyOrNotEncrypted.is_retryable());
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(StorageError::Rusqlite(busy).is_retryable());
    }

    #[test]
    fn test_error_criticality() {
        assert!(StorageError::Encryption("test".to_string()).is_critical());
        assert!(StorageError::WrongKeyOrNotEncrypted.is_critical());
        assert!(!StorageError::Query("test".to_string()).is_critical());
        assert_eq!(StorageError::WrongKeyOrNotEncrypted.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_wrong_key_message_detection() {
        assert!(is_wrong_key_message("file is not a database"));
        assert!(is_wrong_key_message("SQLITE_NOTADB"));
        assert!(!is_wrong_key_message("no such table: _ionickv"));
    }
}
