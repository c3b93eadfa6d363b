//! # keyval Core
//!
//! Storage contract and facade - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for drivers, flat stores and capability detection
//! - The `StorageService` facade that binds to one driver for its lifetime
//!
//! ## Architecture Principles
//! - Depends only on `keyval-common` and `keyval-domain`
//! - No database, file or platform code
//! - All storage media behind traits

pub mod storage;

pub use storage::ports::{CapabilityDetector, FlatStore, KeyValueDriver, Visitor};
pub use storage::service::StorageService;
