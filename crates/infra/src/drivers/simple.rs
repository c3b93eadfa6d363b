//! Flat-store key-value driver.
//!
//! Unencrypted, best-effort storage over a host [`FlatStore`]. Every logical
//! key is namespaced with a fixed prefix and every value is wrapped in a
//! `{"value": ...}` envelope before it's written.

use std::sync::Arc;

use async_trait::async_trait;
use keyval_core::{FlatStore, KeyValueDriver, Visitor};
use keyval_domain::constants::{namespaced_key, strip_namespace};
use keyval_domain::{Backend, KeyValError, Result as DomainResult, StoredValue};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// The JSON shape written for every value
#[derive(Serialize, Deserialize)]
struct Envelope {
    value: StoredValue,
}

/// Unencrypted driver over a host flat store
pub struct FlatStoreDriver {
    store: Arc<dyn FlatStore>,
    handle: RwLock<Option<Arc<dyn FlatStore>>>,
}

impl std::fmt::Debug for FlatStoreDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatStoreDriver").field("bound", &self.handle.read().is_some()).finish()
    }
}

impl FlatStoreDriver {
    /// Driver that will bind to `store` on `create`
    pub fn new(store: Arc<dyn FlatStore>) -> Self {
        Self { store, handle: RwLock::new(None) }
    }

    fn bound(&self) -> DomainResult<Arc<dyn FlatStore>> {
        self.handle.read().clone().ok_or(KeyValError::UninitializedStore)
    }

    fn read(store: &dyn FlatStore, key: &str) -> DomainResult<Option<StoredValue>> {
        let raw = store.get_item(&namespaced_key(key))?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(text) => {
                let envelope: Envelope = serde_json::from_str(text)?;
                Ok(Some(envelope.value))
            }
        }
    }

    fn logical_keys(store: &dyn FlatStore) -> DomainResult<Vec<String>> {
        Ok(store.keys()?.iter().filter_map(|k| strip_namespace(k)).map(str::to_string).collect())
    }
}

#[async_trait]
impl KeyValueDriver for FlatStoreDriver {
    fn backend(&self) -> Backend {
        Backend::Simple
    }

    #[instrument(skip_all)]
    async fn create(&self, _encryption_key: &str) -> DomainResult<()> {
        let mut handle = self.handle.write();
        if handle.is_none() {
            debug!("Encryption unavailable on the flat store; key ignored");
            *handle = Some(Arc::clone(&self.store));
        }
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: StoredValue) -> DomainResult<()> {
        let store = self.bound()?;
        let text = serde_json::to_string(&Envelope { value })?;
        store.set_item(&namespaced_key(key), &text)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> DomainResult<Option<StoredValue>> {
        let store = self.bound()?;
        Self::read(store.as_ref(), key)
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> DomainResult<()> {
        let store = self.bound()?;
        store.remove_item(&namespaced_key(key))?;
        Ok(())
    }

    /// Erases the whole flat store, not just namespaced keys
    #[instrument(skip(self))]
    async fn clear(&self) -> DomainResult<()> {
        let store = self.bound()?;
        store.clear()?;
        Ok(())
    }

    /// The flat store's total item count, foreign keys included
    #[instrument(skip(self))]
    async fn length(&self) -> DomainResult<usize> {
        let store = self.bound()?;
        Ok(store.len()?)
    }

    #[instrument(skip(self))]
    async fn keys(&self) -> DomainResult<Vec<String>> {
        let store = self.bound()?;
        Self::logical_keys(store.as_ref())
    }

    #[instrument(skip_all)]
    async fn for_each(&self, visitor: &mut Visitor<'_>) -> DomainResult<()> {
        let store = self.bound()?;
        let keys = Self::logical_keys(store.as_ref())?;

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = Self::read(store.as_ref(), &key)? {
                entries.push((key, value));
            }
        }

        for (index, (key, value)) in entries.iter().enumerate() {
            visitor(key, value, index + 1);
        }
        Ok(())
    }
}
