//! Configuration structures

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_NAME, DEFAULT_DIRECTORY};
use crate::errors::{KeyValError, Result};
use crate::types::Backend;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Storage location and backend settings
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Where and how data is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the SQLCipher database file
    pub directory: String,

    /// Database file name inside `directory`
    pub database_name: String,

    /// JSON file backing the flat store; in-memory when unset
    pub flat_store_path: Option<String>,

    /// Byte quota for the flat store
    ///
    /// When unset, a file-backed store uses the default budget and an
    /// in-memory store is unbounded.
    pub flat_store_quota_bytes: Option<usize>,

    /// Skip capability detection and use this backend
    pub force_backend: Option<Backend>,

    /// SQLite busy timeout in milliseconds; must be positive
    pub busy_timeout_ms: u64,

    /// Journal in WAL mode
    pub enable_wal: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            directory: DEFAULT_DIRECTORY.to_string(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            flat_store_path: None,
            flat_store_quota_bytes: None,
            force_backend: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            enable_wal: true,
        }
    }
}

impl StorageSettings {
    /// Full path of the database file
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.directory).join(&self.database_name)
    }

    /// Check values that would otherwise fail late, inside `create`
    ///
    /// # Errors
    /// Returns `KeyValError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.database_name.trim().is_empty() {
            return Err(KeyValError::Config("database_name cannot be empty".to_string()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(KeyValError::Config("busy_timeout_ms must be greater than 0".to_string()));
        }
        if self.flat_store_quota_bytes == Some(0) {
            return Err(KeyValError::Config(
                "flat_store_quota_bytes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = StorageSettings::default();
        assert_eq!(settings.database_path(), PathBuf::from("data").join("_ionicstorage"));
        assert_eq!(settings.busy_timeout_ms, 5000);
        assert!(settings.enable_wal);
        assert!(settings.validate().is_ok());
    }

    /// Validates partial documents fall back to defaults field by field.
    ///
    /// Assertions:
    /// - Confirms `directory` comes from the document.
    /// - Confirms `database_name` keeps its default.
    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[storage]
directory = "/var/lib/app"
force_backend = "simple"
"#,
        )
        .unwrap();

        assert_eq!(config.storage.directory, "/var/lib/app");
        assert_eq!(config.storage.database_name, "_ionicstorage");
        assert_eq!(config.storage.force_backend, Some(Backend::Simple));
    }

    #[test]
    fn test_validate_rejects_zero_quota() {
        let settings = StorageSettings { flat_store_quota_bytes: Some(0), ..Default::default() };
        assert!(matches!(settings.validate(), Err(KeyValError::Config(_))));
    }
}
