//! Per-entry expiration watcher.
//!
//! One watcher runs per live entry. It races the entry's deadline against the
//! entry's cancel signal and terminates exactly once: either it removes the
//! entry itself, or it observes the cancel signal and leaves the map alone.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::oneshot;
use tokio::time::{self, Instant};
use tracing::trace;

use crate::store::Shared;

/// Outcome of a watcher's deadline check under the store lock.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Deadline {
    /// The entry was due and has been removed.
    Expired,
    /// The entry was refreshed; wait until the new deadline.
    Rearm(Instant),
    /// The entry is no longer this watcher's to remove.
    Gone,
}

/// Counts a running watcher for as long as it is alive.
///
/// Decrements on drop, so aborted tasks (runtime shutdown) are counted out too.
pub(crate) struct WatcherGuard(Arc<AtomicUsize>);

impl WatcherGuard {
    pub(crate) fn register(gauge: &Arc<AtomicUsize>) -> Self {
        gauge.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(gauge))
    }
}

impl Drop for WatcherGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Waits for the entry `(key, id)` to fall due, then removes it.
///
/// Holds only a weak reference so a dropped store is never kept alive by its
/// watchers. Dropping the store drops every entry, which closes the cancel
/// channels and ends the watchers.
pub(crate) async fn watch_entry<K, V>(
    store: Weak<Shared<K, V>>,
    key: K,
    id: u64,
    deadline: Instant,
    mut cancel: oneshot::Receiver<()>,
    _guard: WatcherGuard,
) where
    K: Eq + Hash,
{
    let timer = time::sleep_until(deadline);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            biased;

            _ = &mut cancel => {
                trace!(entry_id = id, "Expiration watcher cancelled");
                return;
            }

            () = &mut timer => {
                let Some(shared) = store.upgrade() else {
                    return;
                };
                match shared.expire_if_due(&key, id) {
                    Deadline::Expired | Deadline::Gone => return,
                    Deadline::Rearm(next) => {
                        trace!(entry_id = id, "Entry refreshed, re-arming timer");
                        timer.as_mut().reset(next);
                    }
                }
            }
        }
    }
}
