//! Storage constants
//!
//! Names and defaults shared by both backends and the configuration loader.

/// Database file name inside the storage directory
pub const DEFAULT_DATABASE_NAME: &str = "_ionicstorage";
/// Storage directory used when none is configured
pub const DEFAULT_DIRECTORY: &str = "data";

/// Prefix on every flat-store key this crate writes
pub const NAMESPACE_PREFIX: &str = "_ionickv__";

/// SQLite busy timeout
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// File flat-store quota, a typical browser local-storage budget
pub const DEFAULT_FLAT_STORE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Build the physical flat-store key for a logical key
pub fn namespaced_key(key: &str) -> String {
    format!("{NAMESPACE_PREFIX}{key}")
}

/// Strip the namespace prefix, returning `None` for foreign keys
pub fn strip_namespace(physical: &str) -> Option<&str> {
    physical.strip_prefix(NAMESPACE_PREFIX)
}
