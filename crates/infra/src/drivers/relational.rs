//! SQLCipher-backed key-value driver.
//!
//! All entries live in one fixed table. The handle is a single keyed
//! connection shared behind a mutex; every statement runs on the blocking
//! pool so async callers never stall the runtime.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use keyval_common::storage::{
    MetricsSnapshot, SqlCipherConnection, SqlCipherConnectionConfig, StorageConfig, StorageMetrics,
};
use keyval_common::SecureString;
use keyval_core::{KeyValueDriver, Visitor};
use keyval_domain::{Backend, KeyValError, Result as DomainResult, StoredValue};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, Row};
use tokio::task;
use tracing::{debug, error, info, instrument};

use crate::errors::{map_init_error, map_join_error, InfraError};

const CREATE_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS _ionickv(id INTEGER PRIMARY KEY, key unique, value)";
const UPSERT_SQL: &str = "INSERT OR REPLACE INTO _ionickv (key, value) VALUES (?, ?)";
const SELECT_ONE_SQL: &str = "SELECT key, value FROM _ionickv WHERE key = ? LIMIT 1";
const DELETE_ONE_SQL: &str = "DELETE FROM _ionickv WHERE key = ?";
const DELETE_ALL_SQL: &str = "DELETE FROM _ionickv";
const COUNT_SQL: &str = "SELECT COUNT(key) AS c FROM _ionickv";
const SELECT_KEYS_SQL: &str = "SELECT key FROM _ionickv";
const SELECT_ALL_SQL: &str = "SELECT key, value FROM _ionickv";

type Handle = Arc<Mutex<Option<SqlCipherConnection>>>;

/// Encrypted relational driver
pub struct SqlCipherDriver {
    path: PathBuf,
    connection_config: SqlCipherConnectionConfig,
    handle: Handle,
    metrics: Arc<StorageMetrics>,
}

impl std::fmt::Debug for SqlCipherDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlCipherDriver")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}

impl SqlCipherDriver {
    /// Driver for the database file described by `config`
    ///
    /// Nothing is opened until `create`.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            path: config.path.clone(),
            connection_config: SqlCipherConnectionConfig::from(config),
            handle: Arc::new(Mutex::new(None)),
            metrics: Arc::new(StorageMetrics::new()),
        }
    }

    /// Whether `create` has succeeded
    pub fn is_open(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Statement counters since construction
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Run `op` against the open connection on the blocking pool
    async fn run<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqlCipherConnection) -> Result<T, InfraError> + Send + 'static,
    {
        let handle = Arc::clone(&self.handle);
        let metrics = Arc::clone(&self.metrics);

        task::spawn_blocking(move || -> DomainResult<T> {
            let mut guard = handle.lock();
            let conn = guard.as_mut().ok_or(KeyValError::UninitializedStore)?;
            match op(conn) {
                Ok(value) => {
                    metrics.record_query_executed();
                    Ok(value)
                }
                Err(InfraError(err)) => {
                    metrics.record_query_failed();
                    error!(error = %err, "SQLCipher statement failed");
                    Err(err)
                }
            }
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl KeyValueDriver for SqlCipherDriver {
    fn backend(&self) -> Backend {
        Backend::Relational
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn create(&self, encryption_key: &str) -> DomainResult<()> {
        let handle = Arc::clone(&self.handle);
        let metrics = Arc::clone(&self.metrics);
        let path = self.path.clone();
        let config = self.connection_config.clone();
        let key = SecureString::from(encryption_key);

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut guard = handle.lock();
            if guard.is_some() {
                debug!("Database already open; create is a no-op");
                return Ok(());
            }

            match open_database(&path, &key, &config) {
                Ok(conn) => {
                    metrics.record_open();
                    *guard = Some(conn);
                    info!(path = %path.display(), "Encrypted database ready");
                    Ok(())
                }
                Err(err) => {
                    metrics.record_open_failure();
                    error!(error = %err, "Unable to initialize database");
                    Err(err)
                }
            }
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: StoredValue) -> DomainResult<()> {
        let key = key.to_string();
        let text = value.to_json_string()?;
        self.run(move |conn| {
            conn.with_transaction(|tx| {
                tx.execute(UPSERT_SQL, rusqlite::params![key, text])?;
                Ok(())
            })?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> DomainResult<Option<StoredValue>> {
        let key = key.to_string();
        self.run(move |conn| {
            let raw = conn.with_transaction(|tx| {
                Ok(tx.query_row(SELECT_ONE_SQL, [&key], |row| row.get::<_, SqlValue>(1)).optional()?)
            })?;
            Ok(raw.map(decode_value))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> DomainResult<()> {
        let key = key.to_string();
        self.run(move |conn| {
            conn.with_transaction(|tx| {
                tx.execute(DELETE_ONE_SQL, [&key])?;
                Ok(())
            })?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> DomainResult<()> {
        self.run(|conn| {
            conn.with_transaction(|tx| {
                tx.execute(DELETE_ALL_SQL, [])?;
                Ok(())
            })?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn length(&self) -> DomainResult<usize> {
        self.run(|conn| {
            let count: i64 = conn.query_row(COUNT_SQL, &[], |row| row.get(0))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn keys(&self) -> DomainResult<Vec<String>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(SELECT_KEYS_SQL)?;
            Ok(stmt.query_map(&[], |row| read_key(row, 0))?)
        })
        .await
    }

    #[instrument(skip_all)]
    async fn for_each(&self, visitor: &mut Visitor<'_>) -> DomainResult<()> {
        let rows = self
            .run(|conn| {
                let mut stmt = conn.prepare(SELECT_ALL_SQL)?;
                Ok(stmt.query_map(&[], |row| {
                    Ok((read_key(row, 0)?, decode_value(row.get::<_, SqlValue>(1)?)))
                })?)
            })
            .await?;

        debug!(rows = rows.len(), "Visiting entries");
        for (index, (key, value)) in rows.iter().enumerate() {
            visitor(key, value, index + 1);
        }
        Ok(())
    }
}

/// Open, key, verify and prepare the schema
///
/// The connection is only returned once every step succeeded, so a failure
/// never leaves a half-initialized handle behind.
fn open_database(
    path: &std::path::Path,
    key: &SecureString,
    config: &SqlCipherConnectionConfig,
) -> DomainResult<SqlCipherConnection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(map_init_error)?;
    }

    let conn = SqlCipherConnection::open(path, key, config).map_err(map_init_error)?;
    conn.execute(CREATE_TABLE_SQL, &[]).map_err(map_init_error)?;
    Ok(conn)
}

/// Keys are declared without a type, so tolerate non-text rows
fn read_key(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get::<_, SqlValue>(idx)? {
        SqlValue::Text(text) => text,
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        SqlValue::Null => String::new(),
    })
}

/// Turn a raw column into a stored value
///
/// JSON text written by this driver decodes losslessly. Anything else (rows
/// written by other tools) is surfaced rather than failing the read.
fn decode_value(raw: SqlValue) -> StoredValue {
    match raw {
        SqlValue::Text(text) => {
            StoredValue::from_json_str(&text).unwrap_or_else(|_| StoredValue::from(text))
        }
        SqlValue::Integer(i) => StoredValue::from(i),
        SqlValue::Real(f) => StoredValue::from(f),
        SqlValue::Blob(bytes) => StoredValue::from(String::from_utf8_lossy(&bytes).into_owned()),
        SqlValue::Null => StoredValue::null(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    const TEST_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn driver(dir: &TempDir) -> SqlCipherDriver {
        SqlCipherDriver::new(&StorageConfig::new(dir.path().join("_ionicstorage")))
    }

    #[test]
    fn test_decode_value_falls_back_to_text() {
        assert_eq!(decode_value(SqlValue::Text("\"x\"".into())), StoredValue::from("x"));
        assert_eq!(decode_value(SqlValue::Text("plain".into())), StoredValue::from("plain"));
        assert_eq!(decode_value(SqlValue::Integer(4)), StoredValue::from(json!(4)));
        assert!(decode_value(SqlValue::Null).is_null());
    }

    /// Validates the schema created on first open.
    ///
    /// Assertions:
    /// - Confirms the `_ionickv` table exists with `id`, `key`, `value`.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_builds_schema() {
        let dir = TempDir::new().unwrap();
        let driver = driver(&dir);
        driver.create(TEST_KEY).await.unwrap();

        let columns = driver
            .run(|conn| {
                let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('_ionickv')")?;
                Ok(stmt.query_map(&[], |row| row.get::<_, String>(0))?)
            })
            .await
            .unwrap();
        assert_eq!(columns, vec!["id", "key", "value"]);
        assert_eq!(driver.metrics().opens, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_parent_directory_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("db");
        let driver = SqlCipherDriver::new(&StorageConfig::new(path.clone()));

        driver.create(TEST_KEY).await.unwrap();
        assert!(path.exists());
    }

    /// Validates values written by other tools are still readable.
    ///
    /// Assertions:
    /// - Confirms a non-JSON text column reads back as a JSON string.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_foreign_rows_are_readable() {
        let dir = TempDir::new().unwrap();
        let driver = driver(&dir);
        driver.create(TEST_KEY).await.unwrap();

        driver
            .run(|conn| {
                conn.execute(
                    "INSERT INTO _ionickv (key, value) VALUES ('legacy', 'not json')",
                    &[],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(driver.get("legacy").await.unwrap(), Some(StoredValue::from("not json")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_metrics_count_statements() {
        let dir = TempDir::new().unwrap();
        let driver = driver(&dir);
        driver.create(TEST_KEY).await.unwrap();

        driver.set("a", StoredValue::from(1_i64)).await.unwrap();
        driver.get("a").await.unwrap();

        let metrics = driver.metrics();
        assert_eq!(metrics.queries_executed, 2);
        assert_eq!(metrics.queries_failed, 0);
    }
}
