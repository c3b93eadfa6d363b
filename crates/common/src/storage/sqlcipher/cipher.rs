//! SQLCipher configuration
//!
//! Provides SQLCipher pragma configuration for database encryption, the
//! decryption check that catches a wrong key before any schema work, and the
//! probe that tells whether the linked SQLite is SQLCipher at all.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, error};

use crate::security::SecureString;
use crate::storage::error::{is_wrong_key_message, StorageError, StorageResult};

/// SQLCipher configuration
#[derive(Clone)]
pub struct SqlCipherConfig {
    /// Encryption key (zeroized on drop)
    pub key: SecureString,

    /// Cipher compatibility version (default: 4 for SQLCipher 4.x)
    pub cipher_compatibility: i32,

    /// KDF iterations for key derivation (default: 256000)
    pub kdf_iter: i32,

    /// Enable cipher memory security (default: true)
    pub cipher_memory_security: bool,
}

// Custom Debug impl to avoid exposing the key
impl std::fmt::Debug for SqlCipherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlCipherConfig")
            .field("key", &"SecureString(***)")
            .field("cipher_compatibility", &self.cipher_compatibility)
            .field("kdf_iter", &self.kdf_iter)
            .field("cipher_memory_security", &self.cipher_memory_security)
            .finish()
    }
}

impl SqlCipherConfig {
    /// Create default configuration with the given key
    pub fn new(key: impl Into<SecureString>) -> Self {
        Self {
            key: key.into(),
            cipher_compatibility: 4,
            kdf_iter: 256_000,
            cipher_memory_security: true,
        }
    }
}

/// Configure SQLCipher for a connection
///
/// Must be called immediately after opening the connection, before any
/// statement touches the file.
///
/// ```sql
/// PRAGMA key = '<encryption_key>';
/// PRAGMA cipher_compatibility = 4;
/// PRAGMA kdf_iter = 256000;
/// PRAGMA cipher_memory_security = ON;
/// ```
///
/// # Errors
/// Returns an error if any pragma fails to apply
pub fn configure_sqlcipher(conn: &Connection, config: &SqlCipherConfig) -> StorageResult<()> {
    let start = std::time::Instant::now();

    // Key must be first
    conn.pragma_update(None, "key", config.key.expose()).map_err(|e| {
        let err = if is_wrong_key_message(&e.to_string()) {
            StorageError::WrongKeyOrNotEncrypted
        } else {
            StorageError::Encryption(format!("Failed to set encryption key: {}", e))
        };
        error!(error = %err, "SQLCipher key setup failed");
        err
    })?;

    conn.pragma_update(None, "cipher_compatibility", config.cipher_compatibility).map_err(|e| {
        error!(error = %e, "Failed to set cipher_compatibility");
        StorageError::Encryption(format!("Failed to set cipher_compatibility: {}", e))
    })?;

    conn.pragma_update(None, "kdf_iter", config.kdf_iter).map_err(|e| {
        error!(error = %e, "Failed to set kdf_iter");
        StorageError::Encryption(format!("Failed to set kdf_iter: {}", e))
    })?;

    let memory_security = if config.cipher_memory_security { "ON" } else { "OFF" };
    conn.pragma_update(None, "cipher_memory_security", memory_security).map_err(|e| {
        error!(error = %e, "Failed to set cipher_memory_security");
        StorageError::Encryption(format!("Failed to set cipher_memory_security: {}", e))
    })?;

    debug!(duration_ms = start.elapsed().as_millis(), "SQLCipher configuration successful");

    Ok(())
}

/// Verify that the configured key decrypts the database
///
/// Reading `sqlite_master` forces SQLCipher to decrypt the first page, so a
/// wrong key surfaces here rather than on the first user query.
///
/// # Errors
/// Returns `WrongKeyOrNotEncrypted` if the key is wrong or the database isn't
/// encrypted
pub fn verify_encryption(conn: &Connection) -> StorageResult<()> {
    let result = conn
        .query_row("SELECT count(*) FROM sqlite_master", [], |_| Ok(()))
        .map_err(|e| {
            if is_wrong_key_message(&e.to_string()) {
                StorageError::WrongKeyOrNotEncrypted
            } else {
                StorageError::from(e)
            }
        });

    match &result {
        Ok(()) => debug!("Encryption verification successful"),
        Err(e) => error!(error = %e, "Encryption verification failed"),
    }

    result
}

/// Report the SQLCipher version linked into this binary
///
/// Returns `None` when the linked SQLite is not SQLCipher (the pragma is
/// unknown and yields no row) or the query fails for any reason.
pub fn cipher_version(conn: &Connection) -> Option<String> {
    conn.query_row("PRAGMA cipher_version", [], |row| row.get::<_, String>(0))
        .optional()
        .unwrap_or_else(|e| {
            debug!(error = %e, "cipher_version probe failed");
            None
        })
        .filter(|version| !version.is_empty())
}
