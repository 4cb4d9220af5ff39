//! # Capture Store
//!
//! A bounded, observable, thread-safe in-process buffer for captured
//! network requests.
//!
//! ## Core Concepts
//!
//! - **Entries**: captured records, held in insertion order and upserted by id
//! - **Changes**: tagged descriptions of each mutation, fanned out
//!   exactly once to every live observer
//! - **Tokens**: subscription handles whose lifetime controls registration
//! - **Capacity**: oldest-first eviction keeps memory bounded (100 entries
//!   by default)
//!
//! ## Example
//!
//! ```ignore
//! use capture_store::{Change, RequestRecord, Storage};
//!
//! let store = Storage::shared();
//!
//! // Watch for changes; replay of current contents arrives immediately.
//! let token = store.observe(|change| {
//!     if let Change::Appended { entries } = change {
//!         println!("+{} request(s)", entries.len());
//!     }
//! });
//!
//! // The capture layer hands records in from any thread.
//! let mut record = RequestRecord::new("GET", "https://api.example.com/users");
//! store.save(record.clone());
//!
//! // ...response arrives: same id, updates the stored copy in place.
//! record.status = Some(200);
//! record.duration_ms = Some(12.5);
//! store.save(record);
//!
//! drop(token); // unsubscribes
//! ```

pub mod error;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use error::{Result, StoreError};
pub use store::{MemoryPressureHook, Storage, StoreConfig};
pub use subscriptions::{Change, ObserverId, SubscriptionHandle, Token};
pub use types::{Entry, RequestId, RequestRecord, Timestamp};
