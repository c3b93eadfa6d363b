//! Conversions from external infrastructure errors into domain errors.

use keyval_common::storage::StorageError;
use keyval_domain::{HostStoreError, KeyValError};
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub KeyValError);

impl From<InfraError> for KeyValError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<KeyValError> for InfraError {
    fn from(value: KeyValError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoKeyValError {
    fn into_keyval(self) -> KeyValError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → KeyValError */
/* -------------------------------------------------------------------------- */

impl IntoKeyValError for SqlError {
    fn into_keyval(self) -> KeyValError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => KeyValError::Query("database is busy".into()),
                    ErrorCode::DatabaseLocked => KeyValError::Query("database is locked".into()),
                    ErrorCode::DiskFull => KeyValError::Query("database or disk is full".into()),
                    _ => KeyValError::Query(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                KeyValError::Query(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                KeyValError::Query(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => KeyValError::Query("invalid UTF-8 returned from sqlite".into()),
            other => KeyValError::Query(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_keyval())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → KeyValError (post-open statement failures) */
/* -------------------------------------------------------------------------- */

impl IntoKeyValError for StorageError {
    fn into_keyval(self) -> KeyValError {
        match self {
            StorageError::Rusqlite(err) => err.into_keyval(),
            StorageError::WrongKeyOrNotEncrypted => {
                KeyValError::Query("SQLCipher key rejected or database not encrypted".into())
            }
            other => KeyValError::Query(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_keyval())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → HostStoreError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(KeyValError::HostStore(HostStoreError::Io(value.to_string())))
    }
}

/// Wrap any failure raised while opening the relational store
///
/// Every cause surfaces as `DatabaseInit` carrying the cause's text.
pub fn map_init_error(err: impl std::fmt::Display) -> KeyValError {
    KeyValError::DatabaseInit(err.to_string())
}

/// Map a failed blocking task into an internal error
pub fn map_join_error(err: JoinError) -> KeyValError {
    if err.is_cancelled() {
        KeyValError::Internal("blocking storage task cancelled".into())
    } else {
        KeyValError::Internal(format!("blocking storage task failed: {err}"))
    }
}
