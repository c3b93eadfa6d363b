//! Storage drivers implementing `KeyValueDriver`

pub mod relational;
pub mod simple;

pub use relational::SqlCipherDriver;
pub use simple::FlatStoreDriver;
