//! SQLCipher connection wrapper
//!
//! Owns exactly one rusqlite connection that has been keyed, verified and
//! tuned. There is no pool: callers that need concurrency wrap the handle in
//! a mutex.

use std::path::Path;

use rusqlite::{Connection as RusqliteConnection, Row, Statement as RusqliteStatement, ToSql};
use tracing::{debug, instrument};

use super::cipher::{configure_sqlcipher, verify_encryption, SqlCipherConfig};
use super::config::SqlCipherConnectionConfig;
use super::pragmas::apply_connection_pragmas;
use crate::security::SecureString;
use crate::storage::error::{StorageError, StorageResult};

/// A single keyed SQLCipher connection
pub struct SqlCipherConnection {
    inner: RusqliteConnection,
}

impl std::fmt::Debug for SqlCipherConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlCipherConnection").field("path", &self.inner.path()).finish()
    }
}

impl SqlCipherConnection {
    /// Open (creating if needed) an encrypted database file
    ///
    /// The key is applied before anything else reads the file, then verified
    /// by decrypting the schema page. Connection pragmas are applied last.
    ///
    /// # Errors
    /// - `Connection` if the file cannot be opened
    /// - `WrongKeyOrNotEncrypted` if the key does not decrypt an existing file
    /// - `Encryption` / `Query` if pragma setup fails
    #[instrument(skip(key, config), fields(path = %path.as_ref().display()))]
    pub fn open(
        path: impl AsRef<Path>,
        key: &SecureString,
        config: &SqlCipherConnectionConfig,
    ) -> StorageResult<Self> {
        let path = path.as_ref();
        let inner = RusqliteConnection::open(path).map_err(|e| {
            StorageError::Connection(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let cipher = SqlCipherConfig::new(key.clone());
        configure_sqlcipher(&inner, &cipher)?;
        verify_encryption(&inner)?;
        apply_connection_pragmas(&inner, config)?;

        debug!("SQLCipher connection ready");
        Ok(Self { inner })
    }

    /// Get a reference to the inner connection
    pub fn inner(&self) -> &RusqliteConnection {
        &self.inner
    }

    /// Execute a single statement, returning the affected row count
    #[instrument(skip(self, params), fields(sql = %sql))]
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> StorageResult<usize> {
        self.inner.execute(sql, params).map_err(StorageError::from)
    }

    /// Execute a batch of statements separated by semicolons
    #[instrument(skip(self))]
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        self.inner.execute_batch(sql).map_err(StorageError::from)
    }

    /// Execute a SQL query that returns a single row
    ///
    /// The callback function is called with the row data.
    #[instrument(skip(self, params, f), fields(sql = %sql))]
    pub fn query_row<T, F>(&self, sql: &str, params: &[&dyn ToSql], f: F) -> StorageResult<T>
    where
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        self.inner.query_row(sql, params, f).map_err(StorageError::from)
    }

    /// Prepare a SQL statement for efficient repeated execution
    #[instrument(skip(self), fields(sql = %sql))]
    pub fn prepare(&self, sql: &str) -> StorageResult<SqlCipherStatement<'_>> {
        let stmt = self.inner.prepare(sql).map_err(StorageError::from)?;

        Ok(SqlCipherStatement::new(stmt))
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on
    /// `Err`
    #[instrument(skip(self, f))]
    pub fn with_transaction<T, F>(&mut self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> StorageResult<T>,
    {
        let tx = self.inner.transaction().map_err(StorageError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(value)
    }
}

/// SQLCipher prepared statement wrapper
pub struct SqlCipherStatement<'conn> {
    inner: RusqliteStatement<'conn>,
}

impl<'conn> SqlCipherStatement<'conn> {
    fn new(stmt: RusqliteStatement<'conn>) -> Self {
        Self { inner: stmt }
    }

    /// Query with the statement and map results
    pub fn query_map<T, F>(&mut self, params: &[&dyn ToSql], mut f: F) -> StorageResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        let rows = self.inner.query_map(params, |row| f(row)).map_err(StorageError::from)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }
}
