//! Secret-handling primitives used by the storage layer.

pub mod secure_string;

pub use secure_string::SecureString;
