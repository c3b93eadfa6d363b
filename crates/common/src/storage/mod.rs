//! Storage primitives for encrypted databases
//!
//! SQLCipher integration (key pragmas, verification, connection pragmas), the
//! single-connection wrapper the relational driver holds as its handle, and
//! the configuration and error types around them.

pub mod config;
pub mod error;
pub mod metrics;
pub mod sqlcipher;

// Re-export commonly used types
pub use config::{KeySource, StorageConfig, StorageConfigBuilder, ENCRYPTION_KEY_ENV};
pub use error::{StorageError, StorageResult};
pub use metrics::{MetricsSnapshot, StorageMetrics};
pub use sqlcipher::{
    apply_connection_pragmas, cipher_version, SqlCipherConfig, SqlCipherConnection,
    SqlCipherConnectionConfig,
};
