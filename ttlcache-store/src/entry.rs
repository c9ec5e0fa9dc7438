use tokio::sync::oneshot;
use tokio::time::Instant;

/// A stored value together with its expiration state.
pub(crate) struct Entry<V> {
    value: V,
    expires_at: Instant,
    /// Generation number; a watcher only removes the entry it was spawned for.
    id: u64,
    /// Fired exactly once: sent on explicit removal, or closed when dropped.
    cancel: oneshot::Sender<()>,
}

impl<V> Entry<V> {
    pub(crate) fn new(value: V, expires_at: Instant, id: u64, cancel: oneshot::Sender<()>) -> Self {
        Self {
            value,
            expires_at,
            id,
            cancel,
        }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Replaces the value and moves the deadline.
    pub(crate) fn refresh(&mut self, value: V, expires_at: Instant) {
        self.value = value;
        self.expires_at = expires_at;
    }

    /// Tells the entry's watcher to stop. Consumes the entry.
    pub(crate) fn cancel(self) {
        // The receiver is gone once the watcher has already exited.
        let _ = self.cancel.send(());
    }
}
