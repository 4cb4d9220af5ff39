//! Subscription system for live store updates.
//!
//! Observers register a callback with [`Storage::observe`] and from then on
//! receive every [`Change`] the store applies, synchronously, on the thread
//! that performed the mutation. Registration replays the current contents as
//! one `Appended` batch, so an observer joining mid-stream starts from a
//! consistent snapshot and only ever reacts to pushed changes.
//!
//! Subscription lifetime is tied to the returned [`Token`], not to an
//! explicit unsubscribe call: dropping the token deregisters the callback.
//!
//! Observers that live on their own thread can use
//! [`Storage::observe_channel`] instead, which buffers changes in a bounded
//! channel behind a [`SubscriptionHandle`].
//!
//! # Example
//!
//! ```ignore
//! let store = Storage::new();
//!
//! let token = store.observe(|change| match change {
//!     Change::Appended { entries } => println!("+{}", entries.len()),
//!     Change::UpdatedAt { index, .. } => println!("~{}", index),
//!     Change::Removed { range } => println!("-{:?}", range),
//!     Change::Cleared => println!("cleared"),
//! });
//!
//! store.save(RequestRecord::new("GET", "https://example.com"));
//!
//! drop(token); // no further callbacks
//! ```
//!
//! [`Storage::observe`]: crate::store::Storage::observe
//! [`Storage::observe_channel`]: crate::store::Storage::observe_channel

mod token;
mod types;

pub use token::Token;
pub use types::{Change, ObserverId, SubscriptionHandle};
