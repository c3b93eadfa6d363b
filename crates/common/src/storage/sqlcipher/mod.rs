//! SQLCipher backend plumbing
//!
//! One encrypted connection per handle: open, key, verify, tune.

pub mod cipher;
pub mod config;
pub mod connection;
pub mod pragmas;

pub use cipher::{cipher_version, configure_sqlcipher, verify_encryption, SqlCipherConfig};
pub use config::SqlCipherConnectionConfig;
pub use connection::SqlCipherConnection;
pub use pragmas::apply_connection_pragmas;
