//! Configuration loading and management
//!
//! This module provides utilities for loading storage configuration
//! from environment variables and files.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};

/// Serializes tests that mutate process environment variables
#[cfg(test)]
pub(crate) static ENV_LOCK: once_cell::sync::Lazy<parking_lot::Mutex<()>> =
    once_cell::sync::Lazy::new(|| parking_lot::Mutex::new(()));
