//! Process-local flat store

use std::collections::BTreeMap;

use keyval_core::FlatStore;
use keyval_domain::HostStoreError;
use parking_lot::RwLock;

use super::check_quota;

/// In-memory flat store; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryFlatStore {
    items: RwLock<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryFlatStore {
    /// Empty store with no quota
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit total key + value size
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self { items: RwLock::new(BTreeMap::new()), quota_bytes: Some(quota_bytes) }
    }
}

impl FlatStore for MemoryFlatStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, HostStoreError> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), HostStoreError> {
        let mut items = self.items.write();
        check_quota(&items, self.quota_bytes, key, value)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), HostStoreError> {
        self.items.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), HostStoreError> {
        self.items.write().clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, HostStoreError> {
        Ok(self.items.read().keys().cloned().collect())
    }

    fn len(&self) -> Result<usize, HostStoreError> {
        Ok(self.items.read().len())
    }
}
