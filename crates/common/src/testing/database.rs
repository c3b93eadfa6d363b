//! SQLCipher test database helpers.
//!
//! Provides lightweight utilities for creating encrypted SQLite databases
//! backed by SQLCipher for use in integration tests. The helpers keep database
//! lifetimes tied to a temporary directory so clean-up happens automatically
//! when the test completes.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::fixtures::random_key;
use crate::security::SecureString;
use crate::storage::sqlcipher::{SqlCipherConnection, SqlCipherConnectionConfig};
use crate::storage::StorageResult;

/// Manage the lifetime of a temporary SQLCipher database for tests.
///
/// The database file is created inside a temporary directory and removed when
/// the struct is dropped. A dedicated encryption key is generated
/// automatically.
#[derive(Debug)]
pub struct SqlCipherTestDatabase {
    /// Kept here to ensure RAII cleanup when the struct is dropped.
    #[allow(dead_code)]
    temp_dir: TempDir,
    db_path: PathBuf,
    encryption_key: SecureString,
    connection: SqlCipherConnection,
}

impl SqlCipherTestDatabase {
    /// Create a new on-disk SQLCipher database using the default settings.
    pub fn new() -> StorageResult<Self> {
        Self::with_config(SqlCipherConnectionConfig::default())
    }

    /// Create a new on-disk SQLCipher database with custom connection settings.
    pub fn with_config(config: SqlCipherConnectionConfig) -> StorageResult<Self> {
        let temp_dir = TempDir::with_prefix("sqlcipher-test")?;
        let db_path = temp_dir.path().join("sqlcipher.db");
        let key = random_key();

        let connection = SqlCipherConnection::open(&db_path, &key, &config)?;

        Ok(Self { temp_dir, db_path, encryption_key: key, connection })
    }

    /// Borrow the open connection.
    pub fn connection(&self) -> &SqlCipherConnection {
        &self.connection
    }

    /// Open a second, independent connection to the same file.
    pub fn reopen(&self) -> StorageResult<SqlCipherConnection> {
        SqlCipherConnection::open(
            &self.db_path,
            &self.encryption_key,
            &SqlCipherConnectionConfig::default(),
        )
    }

    /// Execute a SQL script (potentially multiple statements) against the
    /// database.
    pub fn run_script(&self, sql: &str) -> StorageResult<()> {
        self.connection.execute_batch(sql)
    }

    /// Return the path of the database file on disk.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Return the SQLCipher encryption key associated with this database.
    pub fn encryption_key(&self) -> &SecureString {
        &self.encryption_key
    }
}
