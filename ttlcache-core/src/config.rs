//! Store configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Default entry lifetime: one minute.
pub const DEFAULT_TTL_MS: u64 = 60_000;

/// Cache configuration.
///
/// The TTL is applied uniformly to every entry; there is no per-key override.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ttlcache_core::CacheConfig;
///
/// let config: CacheConfig = serde_json::from_str(r#"{ "ttl_ms": 250 }"#).unwrap();
/// assert_eq!(config.ttl(), Duration::from_millis(250));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime in milliseconds
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

fn default_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry lifetime.
    ///
    /// Sub-millisecond precision is dropped; a non-zero duration shorter than
    /// a millisecond rounds up to one.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self.ttl_ms = if millis == 0 && !ttl.is_zero() { 1 } else { millis };
        self
    }

    /// Returns the entry lifetime.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Checks the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_ms == 0 {
            return Err(CacheError::InvalidTtl);
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
