//! SQLite pragma management
//!
//! Applies per-connection pragmas once the encryption key has been verified.

use rusqlite::Connection;

use super::config::SqlCipherConnectionConfig;
use crate::storage::error::{StorageError, StorageResult};

/// Apply connection-level pragmas
///
/// - WAL journal mode (optional) with autocheckpoint
/// - NORMAL synchronous mode
/// - Busy timeout for lock contention with other processes
pub fn apply_connection_pragmas(
    conn: &Connection,
    config: &SqlCipherConnectionConfig,
) -> StorageResult<()> {
    let mut pragma_sql = String::new();

    if config.enable_wal {
        pragma_sql.push_str("PRAGMA journal_mode=WAL;\n");
        pragma_sql.push_str("PRAGMA wal_autocheckpoint=1000;\n");
    }

    pragma_sql.push_str("PRAGMA synchronous=NORMAL;\n");

    conn.execute_batch(&pragma_sql)
        .map_err(|e| StorageError::Query(format!("Failed to apply pragmas: {}", e)))?;

    conn.busy_timeout(config.busy_timeout)
        .map_err(|e| StorageError::Query(format!("Failed to set busy timeout: {}", e)))?;

    Ok(())
}
