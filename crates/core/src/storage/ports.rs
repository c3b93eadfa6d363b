//! Port interfaces for key-value storage
//!
//! These traits define the boundaries between the facade and the storage
//! media implemented in infra.

use async_trait::async_trait;
use keyval_domain::{Backend, HostStoreError, Result, StoredValue};

/// Callback handed to [`KeyValueDriver::for_each`]
///
/// Receives `(key, value, index)` where `index` starts at 1 and has no gaps.
pub type Visitor<'a> = dyn FnMut(&str, &StoredValue, usize) + Send + 'a;

/// One storage medium satisfying the key-value contract
///
/// Every operation except `create` must fail with
/// `KeyValError::UninitializedStore` until `create` has succeeded, without
/// touching the medium.
#[async_trait]
pub trait KeyValueDriver: Send + Sync {
    /// Which backend this driver implements
    fn backend(&self) -> Backend;

    /// Open or bind the store handle
    ///
    /// A second call while a handle exists is a no-op, even with a different
    /// key. Drivers that can't encrypt ignore the key.
    async fn create(&self, encryption_key: &str) -> Result<()>;

    /// Insert or overwrite the value for `key`
    async fn set(&self, key: &str, value: StoredValue) -> Result<()>;

    /// Look up `key`; `None` when absent
    async fn get(&self, key: &str) -> Result<Option<StoredValue>>;

    /// Delete `key`; succeeds whether or not it existed
    async fn remove(&self, key: &str) -> Result<()>;

    /// Delete all entries
    async fn clear(&self) -> Result<()>;

    /// Number of entries
    async fn length(&self) -> Result<usize>;

    /// All logical keys, order unspecified
    async fn keys(&self) -> Result<Vec<String>>;

    /// Visit every entry sequentially
    async fn for_each(&self, visitor: &mut Visitor<'_>) -> Result<()>;
}

/// The host's synchronous, string-only key-value store
///
/// Each call is atomic on its own; nothing spans calls.
pub trait FlatStore: Send + Sync {
    /// Raw string stored under `key`, `None` if there isn't one
    fn get_item(&self, key: &str) -> std::result::Result<Option<String>, HostStoreError>;

    /// Store `value` under `key`, replacing any previous item
    ///
    /// Fails with `QuotaExceeded` without changing anything if the store
    /// would grow past its budget.
    fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), HostStoreError>;

    /// Delete `key`; a missing key is not an error
    fn remove_item(&self, key: &str) -> std::result::Result<(), HostStoreError>;

    /// Erase every item, including ones this crate didn't write
    fn clear(&self) -> std::result::Result<(), HostStoreError>;

    /// Every physical key currently stored
    fn keys(&self) -> std::result::Result<Vec<String>, HostStoreError>;

    /// Total item count
    fn len(&self) -> std::result::Result<usize, HostStoreError>;

    /// Whether the store holds no items at all
    fn is_empty(&self) -> std::result::Result<bool, HostStoreError> {
        self.len().map(|len| len == 0)
    }
}

/// Decides once whether the encrypted relational backend can be used
pub trait CapabilityDetector: Send + Sync {
    /// Must not fail; an unavailable or unknown capability is `false`
    fn relational_available(&self) -> bool;
}
