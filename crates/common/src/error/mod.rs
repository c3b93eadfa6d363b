//! Error classification shared across keyval crates
//!
//! Every layer's error type implements [`ErrorClassification`] so logging and
//! callers can reason about failures without matching on concrete variants.
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case |
//! |-------|----------|
//! | **Info** | Expected conditions (absent keys, empty stores) |
//! | **Warning** | Degraded but operational (quota pressure, lock contention) |
//! | **Error** | Failure requiring attention (query failures, bad config) |
//! | **Critical** | Integrity at risk (wrong encryption key, corrupt data) |

use std::fmt;
use std::time::Duration;

/// Error classification trait for consistent error handling across modules
///
/// Nothing in the storage layer retries on its own; callers use this trait
/// to decide whether surfacing, retrying or re-prompting is appropriate.
pub trait ErrorClassification {
    /// Check if this error is retryable
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    ///
    /// Critical errors typically indicate data corruption, key mismatches or
    /// internal invariant violations.
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
