//! Subscription types for live store updates.

use crate::types::Entry;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Duration;

use super::token::Token;

/// Unique identifier for a registered observer.
///
/// Minted by the store at registration time; this is the identity key the
/// callback lives under in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// One mutation applied to the store's ordered collection.
///
/// A change always describes a transition that has already been applied;
/// indices refer to the collection as it stands immediately afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change<E> {
    /// Entries were appended at the end, in order.
    ///
    /// Also the synthetic replay a fresh observer receives: the whole
    /// current collection as one batch, possibly empty.
    Appended { entries: Vec<E> },

    /// A contiguous range of indices was removed (eviction removes `0..1`).
    Removed { range: Range<usize> },

    /// The entry at `index` was replaced in place.
    UpdatedAt { entry: E, index: usize },

    /// The collection was emptied.
    Cleared,
}

/// Handle to a channel-backed subscription.
///
/// Owns its [`Token`], so dropping the handle unsubscribes. Changes pile up
/// in a bounded buffer; a consumer that stops draining is eventually cut off
/// and `recv` reports disconnection.
pub struct SubscriptionHandle<E: Entry> {
    token: Token<E>,
    receiver: crossbeam_channel::Receiver<Change<E>>,
}

impl<E: Entry> SubscriptionHandle<E> {
    pub(crate) fn new(
        token: Token<E>,
        receiver: crossbeam_channel::Receiver<Change<E>>,
    ) -> Self {
        Self { token, receiver }
    }

    /// Receive the next change (blocking).
    pub fn recv(&self) -> Result<Change<E>, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a change (non-blocking).
    pub fn try_recv(&self) -> Result<Change<E>, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Change<E>, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// The token backing this subscription.
    pub fn token(&self) -> &Token<E> {
        &self.token
    }
}
