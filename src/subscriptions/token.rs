//! Observation tokens: handles whose lifetime controls a subscription.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;
use std::sync::Weak;

use crate::store::Storage;
use crate::types::Entry;

use super::types::ObserverId;

/// Opaque handle for one registered observer.
///
/// Returned by [`Storage::observe`]; the registration lives exactly as long
/// as the token. Dropping it (or calling [`Token::stop_observation`]) removes
/// the callback, so an observer torn down without explicit cleanup can never
/// leak a registration. The token holds only a weak reference to its store:
/// it never keeps the store alive, and outliving the store is fine.
#[must_use = "observation stops when the token is dropped"]
pub struct Token<E: Entry> {
    store: Weak<Storage<E>>,
    id: ObserverId,
}

impl<E: Entry> Token<E> {
    pub(crate) fn new(store: Weak<Storage<E>>, id: ObserverId) -> Self {
        Self { store, id }
    }

    pub(crate) fn id(&self) -> ObserverId {
        self.id
    }

    pub(crate) fn belongs_to(&self, store: &Storage<E>) -> bool {
        ptr::eq(self.store.as_ptr(), store)
    }

    /// Stop observing.
    ///
    /// Safe to call any number of times, and after the store itself is gone
    /// (the weak reference then yields nothing to do).
    pub fn stop_observation(&self) {
        if let Some(store) = self.store.upgrade() {
            store.remove_observer(self.id);
        }
    }
}

impl<E: Entry> Drop for Token<E> {
    fn drop(&mut self) {
        self.stop_observation();
    }
}

// Tokens compare by identity: ids are minted per registration and tokens
// are not cloneable, so id equality is instance equality.
impl<E: Entry> PartialEq for Token<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.store, &other.store)
    }
}

impl<E: Entry> Eq for Token<E> {}

impl<E: Entry> Hash for Token<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<E: Entry> fmt::Debug for Token<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("id", &self.id)
            // not useful to print the target unless we were to upgrade it
            .field("store_alive", &(self.store.strong_count() > 0))
            .finish()
    }
}
