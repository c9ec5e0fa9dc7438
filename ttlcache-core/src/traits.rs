//! Common traits for ttlcache.
//!
//! These traits define the interfaces that different implementations can satisfy,
//! so callers can hold a store behind `Arc<dyn Cache<K, V>>`.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for a key-value cache whose entries expire after a fixed TTL.
///
/// None of the operations fail. Absence (never set, expired, or removed) is
/// reported as `None` by [`Cache::get`].
pub trait Cache<K, V>: Send + Sync {
    /// Stores `value` at `key`, resetting the key's TTL if it is already live.
    fn set(&self, key: K, value: V);

    /// Returns a copy of the live value at `key`.
    ///
    /// A lookup does not refresh the TTL.
    fn get(&self, key: &K) -> Option<V>;

    /// Removes `key` immediately. Removing an absent key is a no-op.
    fn expire(&self, key: &K);

    /// Removes every entry.
    fn expire_all(&self);
}
