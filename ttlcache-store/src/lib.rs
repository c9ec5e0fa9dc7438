//! # ttlcache Store
//!
//! In-memory key-value store where every entry expires a fixed TTL after its
//! most recent `set`.
//!
//! Each live entry owns a lightweight watcher task on the tokio runtime. The
//! watcher sleeps until the entry's deadline and then removes it, unless the
//! entry was removed first through [`TtlStore::expire`] or
//! [`TtlStore::expire_all`], in which case the watcher is cancelled and exits
//! without touching the map.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use ttlcache_store::TtlStore;
//!
//! #[tokio::main]
//! async fn main() -> ttlcache_store::Result<()> {
//!     let store = TtlStore::new(Duration::from_millis(50))?;
//!
//!     store.set("session:42".to_string(), "token".to_string());
//!     assert_eq!(store.get("session:42"), Some("token".to_string()));
//!
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     assert_eq!(store.get("session:42"), None);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod entry;
mod store;
mod watcher;

pub use store::TtlStore;

// Re-export the shared types from core
pub use ttlcache_core::{Cache, CacheConfig, CacheError, CacheStats, Result};
