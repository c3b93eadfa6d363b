//! Key-value storage contract and facade

pub mod ports;
pub mod service;
