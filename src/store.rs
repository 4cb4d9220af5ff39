//! Main Storage struct: the bounded collection plus its observer registry.

use crate::error::{Result, StoreError};
use crate::subscriptions::{Change, ObserverId, SubscriptionHandle, Token};
use crate::types::{Entry, RequestRecord};
use crossbeam_channel::TrySendError;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use tracing::{debug, trace, warn};

/// Default number of entries kept before oldest-first eviction kicks in.
const DEFAULT_CAPACITY: usize = 100;

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Maximum entries held. A save that pushes the store past this bound
    /// evicts the oldest entry.
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

type Callback<E> = Box<dyn Fn(&Change<E>) + Send>;

/// State guarded by the store's single mutex.
struct Inner<E: Entry> {
    /// Held entries, insertion order, oldest first.
    entries: VecDeque<E>,
    /// Active observers by id.
    observers: HashMap<ObserverId, Callback<E>>,
}

impl<E: Entry> Inner<E> {
    /// Deliver a change to every registered observer. Caller holds the lock,
    /// so no observer can come or go mid-broadcast.
    fn notify(&self, change: &Change<E>) {
        for observer in self.observers.values() {
            observer(change);
        }
    }
}

/// The capture store.
///
/// A thread-safe, capacity-bounded, insertion-ordered collection of entries
/// together with the registry of observers watching it:
///
/// - [`save`](Storage::save) upserts by entry id and evicts the oldest entry
///   past capacity
/// - [`observe`](Storage::observe) registers a callback and replays the
///   current contents to it
/// - [`clear`](Storage::clear) empties the collection
///
/// Every public operation, including observer notification, runs inside one
/// exclusive critical section scoped to the store, so observers never see the
/// collection mid-mutation and every observer sees the same change sequence.
pub struct Storage<E: Entry> {
    config: StoreConfig,
    /// Counter for generating observer ids.
    next_observer_id: AtomicU64,
    inner: Mutex<Inner<E>>,
}

impl<E: Entry> Storage<E> {
    /// Create a store with the default capacity.
    pub fn new() -> Arc<Self> {
        Self::build(StoreConfig::default())
    }

    /// Create a store with a custom configuration.
    pub fn with_config(config: StoreConfig) -> Result<Arc<Self>> {
        if config.capacity == 0 {
            return Err(StoreError::InvalidCapacity(config.capacity));
        }
        Ok(Self::build(config))
    }

    fn build(config: StoreConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            next_observer_id: AtomicU64::new(1),
            inner: Mutex::new(Inner {
                entries: VecDeque::new(),
                observers: HashMap::new(),
            }),
        })
    }

    // --- Observation ---

    /// Register an observer.
    ///
    /// The callback is invoked synchronously with an `Appended` change
    /// carrying a snapshot of the current entries before this method returns,
    /// inside the same critical section as the registration, so a new
    /// observer can neither miss nor double-receive entries saved
    /// concurrently by another thread.
    ///
    /// Thereafter the callback runs on whichever thread mutates the store,
    /// while the store's lock is held: it must be cheap, must not block, and
    /// must not call back into the store (the lock is not reentrant).
    /// Observers that need to do real work should hand the change off, e.g.
    /// via [`observe_channel`](Storage::observe_channel).
    ///
    /// Observation lasts until the returned [`Token`] is dropped or
    /// [`Token::stop_observation`] is called.
    pub fn observe(
        self: &Arc<Self>,
        callback: impl Fn(&Change<E>) + Send + 'static,
    ) -> Token<E> {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::SeqCst));

        let mut inner = self.inner.lock();
        let snapshot: Vec<E> = inner.entries.iter().cloned().collect();
        callback(&Change::Appended { entries: snapshot });
        inner.observers.insert(id, Box::new(callback));
        debug!(observer = id.0, "observer registered");

        Token::new(Arc::downgrade(self), id)
    }

    /// Observe through a bounded channel instead of a direct callback.
    ///
    /// Convenience for observers that live on their own thread (a UI event
    /// loop, an exporter): changes are cloned into the channel by a callback
    /// that never blocks the producer. A consumer that lets the buffer fill
    /// up is cut off rather than allowed to stall capture; its `recv` then
    /// reports disconnection once the buffer is drained.
    pub fn observe_channel(self: &Arc<Self>, buffer: usize) -> SubscriptionHandle<E> {
        let (sender, receiver) = crossbeam_channel::bounded(buffer);
        let slot = Mutex::new(Some(sender));

        let token = self.observe(move |change| {
            let mut slot = slot.lock();
            let Some(sender) = slot.as_ref() else { return };
            match sender.try_send(change.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("channel subscriber fell behind, cutting it off");
                    *slot = None;
                }
                Err(TrySendError::Disconnected(_)) => {
                    *slot = None;
                }
            }
        });

        SubscriptionHandle::new(token, receiver)
    }

    /// Remove `token`'s callback, if it belongs to this store.
    ///
    /// Equivalent to [`Token::stop_observation`]. Idempotent; a token for
    /// another store is ignored.
    pub fn stop_observing(&self, token: &Token<E>) {
        if token.belongs_to(self) {
            self.remove_observer(token.id());
        }
    }

    pub(crate) fn remove_observer(&self, id: ObserverId) {
        let mut inner = self.inner.lock();
        if inner.observers.remove(&id).is_some() {
            debug!(observer = id.0, "observer removed");
        }
    }

    // --- Mutation ---

    /// Insert or update a captured entry.
    ///
    /// If an entry with the same id is already held, the most recently
    /// inserted match is replaced in place and observers get `UpdatedAt`;
    /// otherwise the entry is appended and observers get a single-element
    /// `Appended`. A save that pushes the store past capacity then evicts the
    /// oldest entry and emits `Removed { range: 0..1 }` as a second, separate
    /// change. Both changes are delivered inside the one critical section, so
    /// observers never see a half-applied transition.
    pub fn save(&self, entry: E) {
        let mut inner = self.inner.lock();

        match inner.entries.iter().rposition(|held| held.id() == entry.id()) {
            Some(index) => {
                inner.entries[index] = entry.clone();
                trace!(index, "entry updated in place");
                inner.notify(&Change::UpdatedAt { entry, index });
            }
            None => {
                inner.entries.push_back(entry.clone());
                trace!(len = inner.entries.len(), "entry appended");
                inner.notify(&Change::Appended {
                    entries: vec![entry],
                });
            }
        }

        // save adds at most one entry, so one eviction restores the bound
        if inner.entries.len() > self.config.capacity {
            inner.entries.pop_front();
            debug!(capacity = self.config.capacity, "oldest entry evicted");
            inner.notify(&Change::Removed { range: 0..1 });
        }
    }

    /// Drop every held entry and broadcast `Cleared`, atomically.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        debug!("store cleared");
        inner.notify(&Change::Cleared);
    }

    // --- Accessors ---

    /// Snapshot of the current entries, oldest first.
    pub fn entries(&self) -> Vec<E> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Configured capacity bound.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    // --- Environment hooks ---

    /// Hand out a hook that flushes this store under memory pressure.
    ///
    /// The store does not sense pressure itself; whatever layer does (an OS
    /// low-memory notification, a cgroup watcher) holds the hook and triggers
    /// it. The hook keeps only a weak reference, so it never extends the
    /// store's lifetime.
    pub fn memory_pressure_hook(self: &Arc<Self>) -> MemoryPressureHook<E> {
        MemoryPressureHook {
            store: Arc::downgrade(self),
        }
    }
}

impl Storage<RequestRecord> {
    /// The process-wide shared store.
    ///
    /// Created on first use with the default capacity and alive until process
    /// exit; there is no teardown beyond normal resource release. Capture
    /// layers and UI panels that want one common buffer go through here;
    /// anything else (tests in particular) can hold its own instance.
    pub fn shared() -> &'static Arc<Storage<RequestRecord>> {
        static SHARED: OnceLock<Arc<Storage<RequestRecord>>> = OnceLock::new();
        SHARED.get_or_init(Storage::new)
    }
}

/// Handle an environment monitor holds to flush the store when the host
/// signals memory pressure.
pub struct MemoryPressureHook<E: Entry> {
    store: Weak<Storage<E>>,
}

impl<E: Entry> MemoryPressureHook<E> {
    /// Clear the store. No-op once the store is gone.
    pub fn trigger(&self) {
        if let Some(store) = self.store.upgrade() {
            debug!("memory pressure, clearing capture store");
            store.clear();
        }
    }
}

impl<E: Entry> Clone for MemoryPressureHook<E> {
    fn clone(&self) -> Self {
        Self {
            store: Weak::clone(&self.store),
        }
    }
}
