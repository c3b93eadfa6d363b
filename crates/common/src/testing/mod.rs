//! Testing utilities and helpers
//!
//! - **[`database`]**: throwaway SQLCipher databases in a temp directory
//! - **[`fixtures`]**: random keys, strings and sample JSON values
//!
//! ## Usage
//!
//! ```rust
//! use keyval_common::testing::SqlCipherTestDatabase;
//!
//! let db = SqlCipherTestDatabase::new().unwrap();
//! db.run_script("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
//! assert!(db.path().exists());
//! ```

pub mod database;
pub mod fixtures;

pub use database::SqlCipherTestDatabase;
pub use fixtures::{random_key, random_string, random_string_seeded, sample_floats, sample_values};
