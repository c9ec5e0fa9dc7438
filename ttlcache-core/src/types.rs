//! Statistics types.

use serde::{Deserialize, Serialize};

/// Snapshot of a store's counters.
///
/// Counters are cumulative since construction; `entries` and
/// `active_watchers` are point-in-time gauges.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Live entries
    pub entries: usize,
    /// First-time inserts (each spawned a watcher)
    pub inserts: u64,
    /// Sets on a key that was already live
    pub refreshes: u64,
    /// Entries removed by their own timer
    pub natural_expirations: u64,
    /// Entries removed by `expire` or `expire_all`
    pub explicit_expirations: u64,
    /// Watcher tasks still running
    pub active_watchers: usize,
}

impl CacheStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries removed by any path.
    pub fn total_expirations(&self) -> u64 {
        self.natural_expirations + self.explicit_expirations
    }
}
