//! Error types used throughout the store

use std::time::Duration;

use keyval_common::{ErrorClassification, ErrorSeverity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for keyval operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum KeyValError {
    #[error("The database has not been initialized. Please run create() before other calls.")]
    UninitializedStore,

    #[error("Unable to initialize database: {0}")]
    DatabaseInit(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    HostStore(#[from] HostStoreError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Faults raised by the host's flat key-value store
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail")]
pub enum HostStoreError {
    #[error("Flat store quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Flat store I/O error: {0}")]
    Io(String),

    #[error("Flat store is corrupt: {0}")]
    Corrupt(String),
}

/// Result type alias for keyval operations
pub type Result<T> = std::result::Result<T, KeyValError>;

impl From<serde_json::Error> for KeyValError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl KeyValError {
    /// Stable label for structured log fields
    pub fn error_type_name(&self) -> &'static str {
        match self {
            Self::UninitializedStore => "uninitialized_store",
            Self::DatabaseInit(_) => "database_init",
            Self::Query(_) => "query",
            Self::HostStore(_) => "host_store",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

impl ErrorClassification for KeyValError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UninitializedStore | Self::Query(_) | Self::Serialization(_) | Self::Config(_) => {
                ErrorSeverity::Error
            }
            Self::HostStore(HostStoreError::QuotaExceeded(_)) => ErrorSeverity::Warning,
            Self::HostStore(HostStoreError::Io(_)) => ErrorSeverity::Error,
            Self::HostStore(HostStoreError::Corrupt(_))
            | Self::DatabaseInit(_)
            | Self::Internal(_) => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
