//! Immutable-by-replacement state cells with change listeners.
//!
//! Every mutation builds a new `Arc<T>` snapshot and bumps the revision, so a
//! reader holding an older `Arc` never sees a half-applied update.

use std::fmt;
use std::sync::Arc;

/// Handle returned by [`Observable::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Box<dyn FnMut(&Arc<T>) + Send>;

pub struct Observable<T> {
    snapshot: Arc<T>,
    revision: u64,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
}

impl<T> Observable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            snapshot: Arc::new(initial),
            revision: 0,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn get(&self) -> &Arc<T> {
        &self.snapshot
    }

    /// Number of snapshots published since construction.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Publishes `next` unconditionally.
    pub fn replace(&mut self, next: T) {
        self.snapshot = Arc::new(next);
        self.revision += 1;
        for (_, listener) in &mut self.listeners {
            listener(&self.snapshot);
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Arc<T>) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}

impl<T: Clone + PartialEq> Observable<T> {
    /// Applies `edit` to a copy of the snapshot and publishes it if anything
    /// changed. Returns whether a new snapshot was published.
    pub fn update<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut next = (*self.snapshot).clone();
        edit(&mut next);
        if next == *self.snapshot {
            return false;
        }
        self.replace(next);
        true
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("snapshot", &self.snapshot)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
