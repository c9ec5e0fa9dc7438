//! The TTL store.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, trace};

use ttlcache_core::error::{CacheError, Result};
use ttlcache_core::traits::Cache;
use ttlcache_core::types::CacheStats;
use ttlcache_core::CacheConfig;

use crate::entry::Entry;
use crate::watcher::{self, Deadline, WatcherGuard};

/// Deadline used when `now + ttl` does not fit in an `Instant` (~30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn deadline_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE)
}

/// State shared between store handles and their watchers.
pub(crate) struct Shared<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Duration,
    next_id: AtomicU64,
    /// Running watchers; outlives the store so late watchers can still count out.
    watchers: Arc<AtomicUsize>,
    inserts: AtomicU64,
    refreshes: AtomicU64,
    natural_expirations: AtomicU64,
    explicit_expirations: AtomicU64,
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash,
{
    /// Removes `key` if it still belongs to watcher `id` and its deadline has passed.
    pub(crate) fn expire_if_due(&self, key: &K, id: u64) -> Deadline {
        let mut entries = self.entries.write();

        let deadline = match entries.get(key) {
            Some(entry) if entry.id() == id => entry.expires_at(),
            _ => return Deadline::Gone,
        };
        if deadline > Instant::now() {
            return Deadline::Rearm(deadline);
        }

        if let Some(entry) = entries.remove(key) {
            entry.cancel();
        }
        self.natural_expirations.fetch_add(1, Ordering::Relaxed);
        debug!(entry_id = id, "Entry expired");
        Deadline::Expired
    }

    fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = self.entries.write();
        match entries.remove(key) {
            Some(entry) => {
                trace!(entry_id = entry.id(), "Entry expired explicitly");
                entry.cancel();
                self.explicit_expirations.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }
}

impl<K, V> Drop for Shared<K, V> {
    fn drop(&mut self) {
        // Dropping the entries closes every cancel channel.
        debug!(entries = self.entries.get_mut().len(), "TTL store dropped");
    }
}

/// Thread-safe in-memory key-value store with per-entry TTL.
///
/// Every entry expires `ttl` after its most recent [`set`](Self::set). A
/// [`get`](Self::get) never refreshes the TTL.
///
/// Cloning is cheap and yields another handle to the same store. The store
/// and all its watchers go away when the last handle is dropped.
///
/// # Locking
///
/// A single readers-writer lock guards the map. Lookups take the shared lock
/// and run concurrently; `set`, `expire`, `expire_all` and watcher removals
/// take the exclusive lock. The lock is never held across an `.await`.
pub struct TtlStore<K, V> {
    shared: Arc<Shared<K, V>>,
    handle: Handle,
}

impl<K, V> Clone for TtlStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            handle: self.handle.clone(),
        }
    }
}

impl<K, V> TtlStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates an empty store whose watchers run on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidTtl`] if `ttl` is zero.
    /// - [`CacheError::NoRuntime`] if called outside a tokio runtime; use
    ///   [`with_handle`](Self::with_handle) from plain threads.
    pub fn new(ttl: Duration) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
        Self::with_handle(ttl, handle)
    }

    /// Creates a store from a validated configuration.
    pub fn with_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.ttl())
    }

    /// Creates a store whose watchers are spawned on `handle`.
    ///
    /// The store itself can then be used from any thread.
    pub fn with_handle(ttl: Duration, handle: Handle) -> Result<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }

        debug!(
            ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            "TTL store created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(HashMap::new()),
                ttl,
                next_id: AtomicU64::new(1),
                watchers: Arc::new(AtomicUsize::new(0)),
                inserts: AtomicU64::new(0),
                refreshes: AtomicU64::new(0),
                natural_expirations: AtomicU64::new(0),
                explicit_expirations: AtomicU64::new(0),
            }),
            handle,
        })
    }

    /// Stores `value` at `key` and (re)starts its TTL.
    ///
    /// A new key gets a fresh watcher. A key still in the map keeps its
    /// watcher; only the value and the deadline change. If that entry was
    /// already overdue it counts as expired and re-inserted, since readers
    /// could no longer see it.
    pub fn set(&self, key: K, value: V) {
        let mut entries = self.shared.entries.write();
        let now = Instant::now();
        let expires_at = deadline_after(now, self.shared.ttl);

        if let Some(entry) = entries.get_mut(&key) {
            if entry.is_expired(now) {
                self.shared.natural_expirations.fetch_add(1, Ordering::Relaxed);
                self.shared.inserts.fetch_add(1, Ordering::Relaxed);
                trace!(entry_id = entry.id(), "Overdue entry replaced");
            } else {
                self.shared.refreshes.fetch_add(1, Ordering::Relaxed);
                trace!(entry_id = entry.id(), "Entry refreshed");
            }
            entry.refresh(value, expires_at);
            return;
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        entries.insert(key.clone(), Entry::new(value, expires_at, id, cancel_tx));
        self.shared.inserts.fetch_add(1, Ordering::Relaxed);

        let guard = WatcherGuard::register(&self.shared.watchers);
        self.handle.spawn(watcher::watch_entry(
            Arc::downgrade(&self.shared),
            key,
            id,
            expires_at,
            cancel_rx,
            guard,
        ));
        trace!(entry_id = id, "Spawned expiration watcher");
    }

    /// Returns a copy of the live value at `key`.
    ///
    /// Entries past their deadline read as absent even before their watcher
    /// has removed them.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let now = Instant::now();
        let entries = self.shared.entries.read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value().clone())
    }

    /// Returns true if `key` holds a live value.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.shared
            .entries
            .read()
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Removes `key` now, regardless of its remaining TTL, and stops its watcher.
    ///
    /// Removing an absent key is a no-op.
    pub fn expire<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shared.remove(key);
    }

    /// Removes every entry and stops every watcher.
    pub fn expire_all(&self) {
        let mut entries = self.shared.entries.write();
        let drained = std::mem::take(&mut *entries);
        let count = drained.len();

        for entry in drained.into_values() {
            entry.cancel();
        }
        self.shared
            .explicit_expirations
            .fetch_add(count as u64, Ordering::Relaxed);
        drop(entries);

        debug!(count, "Expired all entries");
    }
}

impl<K, V> TtlStore<K, V> {
    /// Returns the TTL applied to every entry.
    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    /// Returns the number of live entries.
    ///
    /// Overdue entries whose watcher has not run yet are not counted, matching
    /// what [`get`](Self::get) can see.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.shared
            .entries
            .read()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Returns true if the store holds no live entries.
    pub fn is_empty(&self) -> bool {
        let now = Instant::now();
        self.shared
            .entries
            .read()
            .values()
            .all(|entry| entry.is_expired(now))
    }

    /// Returns the number of watcher tasks still running.
    pub fn active_watchers(&self) -> usize {
        self.shared.watchers.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of the store's counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            inserts: self.shared.inserts.load(Ordering::Relaxed),
            refreshes: self.shared.refreshes.load(Ordering::Relaxed),
            natural_expirations: self.shared.natural_expirations.load(Ordering::Relaxed),
            explicit_expirations: self.shared.explicit_expirations.load(Ordering::Relaxed),
            active_watchers: self.active_watchers(),
        }
    }
}

impl<K, V> fmt::Debug for TtlStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlStore")
            .field("ttl", &self.shared.ttl)
            .field("entries", &self.len())
            .field("active_watchers", &self.active_watchers())
            .finish()
    }
}

impl<K, V> Cache<K, V> for TtlStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn set(&self, key: K, value: V) {
        TtlStore::set(self, key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        TtlStore::get(self, key)
    }

    fn expire(&self, key: &K) {
        TtlStore::expire(self, key);
    }

    fn expire_all(&self) {
        TtlStore::expire_all(self);
    }
}
