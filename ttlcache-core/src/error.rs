//! Error types for ttlcache.
//!
//! Lookups never fail: a missing or expired key is `None`, not an error.
//! The variants here cover constructing a store and loading its configuration.

use thiserror::Error;

/// Result type alias using `CacheError`.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type for store construction and configuration.
#[derive(Debug, Error)]
pub enum CacheError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CONSTRUCTION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The TTL was zero; entries would expire before they could be read.
    #[error("Invalid TTL: must be greater than zero")]
    InvalidTtl,

    /// No tokio runtime was available to run expiration watchers.
    #[error("No tokio runtime available: construct the store inside a runtime or pass a handle")]
    NoRuntime,

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CacheError {
    /// Returns true if this error came from loading or validating configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidTtl
                | CacheError::JsonError(_)
                | CacheError::IoError(_)
        )
    }
}
