//! Storage facade - core business logic
//!
//! The facade consults the capability detector exactly once, keeps the
//! winning driver, and forwards every call to it without branching.

use keyval_common::ErrorClassification;
use keyval_domain::{Backend, Entry, KeyValError, Result, StoredValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::ports::{CapabilityDetector, KeyValueDriver, Visitor};

/// The single public key-value contract
pub struct StorageService {
    driver: Box<dyn KeyValueDriver>,
    backend: Backend,
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService").field("backend", &self.backend).finish()
    }
}

impl StorageService {
    /// Select a driver using `detector` and drop the other one
    pub fn new(
        detector: &dyn CapabilityDetector,
        relational: Box<dyn KeyValueDriver>,
        simple: Box<dyn KeyValueDriver>,
    ) -> Self {
        let driver = if detector.relational_available() { relational } else { simple };
        let service = Self::with_driver(driver);
        info!(backend = %service.backend, "Storage backend selected");
        service
    }

    /// Bind directly to a driver, skipping detection
    pub fn with_driver(driver: Box<dyn KeyValueDriver>) -> Self {
        let backend = driver.backend();
        Self { driver, backend }
    }

    /// Which backend this facade is bound to
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Open the store handle; idempotent
    #[instrument(level = "debug", skip_all, fields(backend = %self.backend))]
    pub async fn create(&self, encryption_key: &str) -> Result<()> {
        self.driver.create(encryption_key).await.map_err(|e| log_failure("create", e))
    }

    /// Store `value` under `key`, replacing any previous value
    #[instrument(level = "debug", skip(self, value), fields(backend = %self.backend))]
    pub async fn set(&self, key: &str, value: impl Into<StoredValue> + Send) -> Result<()> {
        self.driver.set(key, value.into()).await.map_err(|e| log_failure("set", e))
    }

    /// Value under `key`, `None` when the key is absent
    #[instrument(level = "debug", skip(self), fields(backend = %self.backend))]
    pub async fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        let value = self.driver.get(key).await.map_err(|e| log_failure("get", e))?;
        debug!(found = value.is_some(), "get complete");
        Ok(value)
    }

    /// Delete `key`; removing a missing key succeeds
    #[instrument(level = "debug", skip(self), fields(backend = %self.backend))]
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.driver.remove(key).await.map_err(|e| log_failure("remove", e))
    }

    /// Delete every entry
    ///
    /// On the simple backend this erases the whole host flat store, including
    /// data other components wrote there.
    #[instrument(level = "debug", skip(self), fields(backend = %self.backend))]
    pub async fn clear(&self) -> Result<()> {
        self.driver.clear().await.map_err(|e| log_failure("clear", e))
    }

    /// Number of entries
    ///
    /// On the simple backend this is the host flat store's total item count,
    /// not just the namespaced keys.
    #[instrument(level = "debug", skip(self), fields(backend = %self.backend))]
    pub async fn length(&self) -> Result<usize> {
        self.driver.length().await.map_err(|e| log_failure("length", e))
    }

    /// Every logical key, order unspecified
    #[instrument(level = "debug", skip(self), fields(backend = %self.backend))]
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.driver.keys().await.map_err(|e| log_failure("keys", e))
    }

    /// Visit every entry with `(key, value, index)`, index starting at 1
    #[instrument(level = "debug", skip_all, fields(backend = %self.backend))]
    pub async fn for_each<F>(&self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&str, &StoredValue, usize) + Send,
    {
        let visitor: &mut Visitor<'_> = &mut visitor;
        self.driver.for_each(visitor).await.map_err(|e| log_failure("for_each", e))
    }

    /// Collect every entry in visiting order
    pub async fn entries(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        self.for_each(|key, value, _| entries.push(Entry::new(key, value.clone()))).await?;
        Ok(entries)
    }

    /// Encode `value` as JSON and store it
    ///
    /// # Errors
    /// `KeyValError::Serialization` if `value` has no JSON form, otherwise
    /// whatever the driver reports.
    pub async fn set_serialized<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized + Sync,
    {
        let stored = StoredValue::from_serializable(value)?;
        self.set(key, stored).await
    }

    /// Read `key` and decode it into `T`
    ///
    /// # Errors
    /// `KeyValError::Serialization` if the stored shape doesn't match `T`.
    pub async fn get_deserialized<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(value) => value.deserialize_into().map(Some),
            None => Ok(None),
        }
    }
}

fn log_failure(operation: &'static str, err: KeyValError) -> KeyValError {
    warn!(
        operation,
        error = %err,
        error_type = err.error_type_name(),
        severity = %err.severity(),
        "Storage operation failed"
    );
    err
}
