//! Runtime capability detection
//!
//! Decides once, at construction, whether the encrypted relational backend is
//! usable in this process.

use keyval_common::storage::cipher_version;
use keyval_core::CapabilityDetector;
use keyval_domain::Backend;
use rusqlite::Connection;
use tracing::{debug, info};

/// Probes the linked SQLite for SQLCipher support
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlCipherProbe;

impl SqlCipherProbe {
    /// A probe; nothing is opened until it's consulted
    pub fn new() -> Self {
        Self
    }
}

impl CapabilityDetector for SqlCipherProbe {
    fn relational_available(&self) -> bool {
        let conn = match Connection::open_in_memory() {
            Ok(conn) => conn,
            Err(e) => {
                debug!(error = %e, "In-memory probe connection failed");
                return false;
            }
        };

        match cipher_version(&conn) {
            Some(version) => {
                info!(cipher_version = %version, "SQLCipher available");
                true
            }
            None => {
                debug!("SQLCipher not available");
                false
            }
        }
    }
}

/// Fixed answer, for overrides and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCapability(pub bool);

impl StaticCapability {
    /// Detector that always picks `backend`
    pub fn forcing(backend: Backend) -> Self {
        Self(backend == Backend::Relational)
    }
}

impl CapabilityDetector for StaticCapability {
    fn relational_available(&self) -> bool {
        self.0
    }
}
