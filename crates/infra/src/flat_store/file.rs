//! Flat store persisted as one JSON document
//!
//! The whole map is kept in memory and rewritten on every mutation through a
//! temp file in the same directory followed by a rename, so a crash leaves
//! either the old document or the new one.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use keyval_core::FlatStore;
use keyval_domain::constants::DEFAULT_FLAT_STORE_QUOTA_BYTES;
use keyval_domain::HostStoreError;
use parking_lot::Mutex;
use tracing::{debug, error};

use super::check_quota;

/// File-backed flat store
#[derive(Debug)]
pub struct FileFlatStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl FileFlatStore {
    /// Open `path` with the default quota, creating an empty store if missing
    ///
    /// # Errors
    /// - `Io` if the file exists but can't be read
    /// - `Corrupt` if it isn't a JSON object of strings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HostStoreError> {
        Self::open_with_quota(path, Some(DEFAULT_FLAT_STORE_QUOTA_BYTES))
    }

    /// Open `path` with an explicit quota (`None` for unlimited)
    pub fn open_with_quota(
        path: impl Into<PathBuf>,
        quota_bytes: Option<usize>,
    ) -> Result<Self, HostStoreError> {
        let path = path.into();
        let items = load_document(&path)?;
        debug!(path = %path.display(), items = items.len(), "Flat store opened");
        Ok(Self { path, items: Mutex::new(items), quota_bytes })
    }

    /// The JSON document backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), HostStoreError> {
        write_document(&self.path, items).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "Flat store write failed");
            e
        })
    }
}

impl FlatStore for FileFlatStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, HostStoreError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), HostStoreError> {
        let mut items = self.items.lock();
        check_quota(&items, self.quota_bytes, key, value)?;

        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&items) {
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), HostStoreError> {
        let mut items = self.items.lock();
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&items) {
            items.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), HostStoreError> {
        let mut items = self.items.lock();
        self.persist(&BTreeMap::new())?;
        items.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, HostStoreError> {
        Ok(self.items.lock().keys().cloned().collect())
    }

    fn len(&self) -> Result<usize, HostStoreError> {
        Ok(self.items.lock().len())
    }
}

fn load_document(path: &Path) -> Result<BTreeMap<String, String>, HostStoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(HostStoreError::Io(format!("failed to read {}: {e}", path.display())))
        }
    };

    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&contents)
        .map_err(|e| HostStoreError::Corrupt(format!("{}: {e}", path.display())))
}

fn write_document(path: &Path, items: &BTreeMap<String, String>) -> Result<(), HostStoreError> {
    let io_err = |action: &str, e: &dyn std::fmt::Display| {
        HostStoreError::Io(format!("failed to {action} {}: {e}", path.display()))
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| io_err("create directory for", &e))?;

    let body = serde_json::to_vec(items).map_err(|e| io_err("encode", &e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| io_err("stage", &e))?;
    tmp.write_all(&body).map_err(|e| io_err("write", &e))?;
    tmp.as_file().sync_all().map_err(|e| io_err("sync", &e))?;
    tmp.persist(path).map_err(|e| io_err("replace", &e))?;

    Ok(())
}
