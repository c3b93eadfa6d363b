//! # keyval Infrastructure
//!
//! Infrastructure implementations of the core storage ports.
//!
//! This crate contains:
//! - The SQLCipher driver (encrypted, transactional)
//! - The flat-store driver and its host stores (memory, JSON file)
//! - Capability detection
//! - Configuration loading
//! - [`open_storage`], the composition root wiring all of the above
//!
//! ## Architecture
//! - Implements traits defined in `keyval-core`
//! - Contains all "impure" code (SQLite, filesystem, environment)

pub mod capability;
pub mod config;
pub mod drivers;
pub mod errors;
pub mod flat_store;
pub mod storage;

// Re-export commonly used items
pub use capability::{SqlCipherProbe, StaticCapability};
pub use drivers::{FlatStoreDriver, SqlCipherDriver};
pub use errors::InfraError;
pub use flat_store::{FileFlatStore, MemoryFlatStore};
pub use storage::{open_storage, open_storage_with};
