//! Composition root
//!
//! Wires configuration, capability detection and both candidate drivers into
//! a [`StorageService`].

use std::sync::Arc;
use std::time::Duration;

use keyval_common::storage::StorageConfig;
use keyval_core::{CapabilityDetector, FlatStore, StorageService};
use keyval_domain::constants::DEFAULT_FLAT_STORE_QUOTA_BYTES;
use keyval_domain::{Config, KeyValError, Result};
use tracing::info;

use crate::capability::{SqlCipherProbe, StaticCapability};
use crate::drivers::{FlatStoreDriver, SqlCipherDriver};
use crate::flat_store::{FileFlatStore, MemoryFlatStore};

/// Build a storage facade from configuration
///
/// Uses the SQLCipher probe unless `force_backend` is set.
///
/// # Errors
/// `KeyValError::Config` for invalid settings, `KeyValError::HostStore` if a
/// configured flat-store file can't be read.
pub fn open_storage(config: &Config) -> Result<StorageService> {
    match config.storage.force_backend {
        Some(backend) => {
            info!(backend = %backend, "Backend forced by configuration");
            open_storage_with(config, &StaticCapability::forcing(backend))
        }
        None => open_storage_with(config, &SqlCipherProbe::new()),
    }
}

/// Build a storage facade with an explicit capability detector
///
/// # Errors
/// See [`open_storage`].
pub fn open_storage_with(
    config: &Config,
    detector: &dyn CapabilityDetector,
) -> Result<StorageService> {
    let settings = &config.storage;
    settings.validate()?;

    let storage_config = StorageConfig::builder(settings.database_path())
        .busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
        .enable_wal(settings.enable_wal)
        .build()
        .map_err(|e| KeyValError::Config(e.to_string()))?;

    let flat_store: Arc<dyn FlatStore> = match &settings.flat_store_path {
        Some(path) => Arc::new(FileFlatStore::open_with_quota(
            path,
            Some(settings.flat_store_quota_bytes.unwrap_or(DEFAULT_FLAT_STORE_QUOTA_BYTES)),
        )?),
        None => Arc::new(match settings.flat_store_quota_bytes {
            Some(quota) => MemoryFlatStore::with_quota(quota),
            None => MemoryFlatStore::new(),
        }),
    };

    Ok(StorageService::new(
        detector,
        Box::new(SqlCipherDriver::new(&storage_config)),
        Box::new(FlatStoreDriver::new(flat_store)),
    ))
}
