//! Storage configuration
//!
//! Configuration for a single SQLCipher database file (its location and the
//! per-connection pragmas) and the sources an encryption key can come from.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::error::{StorageError, StorageResult};
use crate::security::SecureString;

/// Default keychain service used when no key source is configured
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "keyval";

/// Default keychain account holding the database key
pub const DEFAULT_KEYCHAIN_ACCOUNT: &str = "db_encryption_key";

/// Environment variable consulted before falling back to the keychain
pub const ENCRYPTION_KEY_ENV: &str = "KEYVAL_ENCRYPTION_KEY";

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Database file path
    pub path: PathBuf,

    /// Busy timeout in milliseconds (default: 5000)
    pub busy_timeout_ms: u64,

    /// Enable WAL mode (default: true)
    pub enable_wal: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/_ionicstorage"),
            busy_timeout_ms: 5000,
            enable_wal: true,
        }
    }
}

impl StorageConfig {
    /// Create a new configuration with the given path
    pub fn new(path: PathBuf) -> Self {
        Self { path, ..Default::default() }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `StorageError::InvalidConfig` if any value is out of range.
    pub fn validate(&self) -> StorageResult<()> {
        if self.busy_timeout_ms == 0 {
            return Err(StorageError::InvalidConfig(
                "busy_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.path.as_os_str().is_empty() {
            return Err(StorageError::InvalidConfig("database path cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Set the busy timeout
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Disable WAL mode
    pub fn without_wal(mut self) -> Self {
        self.enable_wal = false;
        self
    }

    /// Create a builder that validates on `build`
    pub fn builder(path: PathBuf) -> StorageConfigBuilder {
        StorageConfigBuilder::new(path)
    }
}

/// Builder for StorageConfig with validation
#[derive(Debug)]
pub struct StorageConfigBuilder {
    config: StorageConfig,
}

impl StorageConfigBuilder {
    /// Create a new builder
    pub fn new(path: PathBuf) -> Self {
        Self { config: StorageConfig::new(path) }
    }

    /// Set busy timeout
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_busy_timeout(timeout);
        self
    }

    /// Toggle WAL mode
    pub fn enable_wal(mut self, enabled: bool) -> Self {
        self.config.enable_wal = enabled;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> StorageResult<StorageConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Source for encryption keys
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from platform keychain
    ///
    /// - macOS: Keychain Access
    /// - Windows: Credential Manager
    /// - Linux: Secret Service
    Keychain { service: String, username: String },

    /// Load from environment variable
    Environment { var_name: String },

    /// Use provided key directly (tests and scripted setups)
    Direct { key: String },
}

impl Default for KeySource {
    fn default() -> Self {
        if std::env::var(ENCRYPTION_KEY_ENV).is_ok() {
            Self::Environment { var_name: ENCRYPTION_KEY_ENV.to_string() }
        } else {
            Self::Keychain {
                service: DEFAULT_KEYCHAIN_SERVICE.to_string(),
                username: DEFAULT_KEYCHAIN_ACCOUNT.to_string(),
            }
        }
    }
}

impl KeySource {
    /// Create an environment variable key source
    pub fn environment(var_name: impl Into<String>) -> Self {
        Self::Environment { var_name: var_name.into() }
    }

    /// Create a direct key source
    pub fn direct(key: impl Into<String>) -> Self {
        Self::Direct { key: key.into() }
    }

    /// Fetch the key material this source points at.
    ///
    /// # Errors
    /// - `KeyUnavailable` if the variable is unset or the key is empty
    /// - `Keychain` if the platform keychain cannot be read
    pub fn resolve(&self) -> StorageResult<SecureString> {
        let key = match self {
            Self::Direct { key } => key.clone(),
            Self::Environment { var_name } => std::env::var(var_name).map_err(|_| {
                StorageError::KeyUnavailable(format!("environment variable {var_name} not set"))
            })?,
            Self::Keychain { service, username } => {
                debug!(service = %service, username = %username, "Reading key from keychain");
                let entry = keyring::Entry::new(service, username)
                    .map_err(|e| StorageError::Keychain(e.to_string()))?;
                entry.get_password().map_err(|e| match e {
                    keyring::Error::NoEntry => StorageError::KeyUnavailable(format!(
                        "no keychain entry for {service}/{username}"
                    )),
                    other => StorageError::Keychain(other.to_string()),
                })?
            }
        };

        if key.is_empty() {
            return Err(StorageError::KeyUnavailable("encryption key is empty".to_string()));
        }

        Ok(SecureString::new(key))
    }
}
