//! Per-connection settings for a SQLCipher handle

use std::time::Duration;

use crate::storage::config::StorageConfig;

/// Connection-level settings applied after the key is verified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlCipherConnectionConfig {
    /// Busy timeout for SQLite operations
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,
}

impl From<&StorageConfig> for SqlCipherConnectionConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            enable_wal: config.enable_wal,
        }
    }
}

impl Default for SqlCipherConnectionConfig {
    fn default() -> Self {
        Self { busy_timeout: Duration::from_millis(5000), enable_wal: true }
    }
}
