//! # keyval Domain
//!
//! Domain types shared by every layer of the key-value store.
//!
//! This crate contains:
//! - The stored value codec boundary (`StoredValue`) and entry shapes
//! - Backend identity (`Backend`)
//! - Error types and the `Result` alias
//! - Configuration structures
//! - Namespacing and default constants
//!
//! ## Architecture
//! - Depends only on `keyval-common` for error classification
//! - No I/O, no async runtime

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
