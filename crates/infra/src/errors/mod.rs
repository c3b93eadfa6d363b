//! Infrastructure error conversions

mod conversions;

pub use conversions::{map_init_error, map_join_error, InfraError};
