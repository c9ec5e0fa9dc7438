//! # ttlcache Core
//!
//! Core types, errors, and traits shared by the ttlcache crates.
//!
//! - **Config**: [`CacheConfig`], the single construction-time setting (TTL)
//! - **Errors**: [`CacheError`] for the few fallible steps (construction, config loading)
//! - **Traits**: [`Cache`], the interface every TTL store satisfies
//! - **Types**: [`CacheStats`] snapshots
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use ttlcache_core::CacheConfig;
//!
//! let config = CacheConfig::default().with_ttl(Duration::from_secs(30));
//! assert!(config.validate().is_ok());
//! assert_eq!(config.ttl(), Duration::from_secs(30));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use traits::Cache;
pub use types::CacheStats;
