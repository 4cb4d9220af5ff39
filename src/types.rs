//! Core types for the capture store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// An entry the store can hold.
///
/// The store is opaque to everything about its entries except identity:
/// saving an entry whose id matches one already held replaces the held copy
/// in place instead of appending. Entries are cloned into observer
/// notifications, so keep them cheap to clone (or reference-counted).
pub trait Entry: Clone + Send + 'static {
    /// Identity used for update-in-place matching.
    type Id: PartialEq;

    fn id(&self) -> Self::Id;
}

/// Unique identifier for a captured request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Mint a fresh process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RequestId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// One captured HTTP exchange.
///
/// Created when the request is intercepted (no status yet) and saved again
/// under the same id once the response or error lands, which updates the
/// stored copy in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Unique identifier (stable across the request's lifetime).
    pub id: RequestId,

    /// HTTP method, as sent.
    pub method: String,

    /// Full request URL.
    pub url: String,

    /// Response status code; `None` while the request is in flight.
    pub status: Option<u16>,

    /// When the request was intercepted.
    pub started_at: Timestamp,

    /// Wall-clock duration, set on completion.
    pub duration_ms: Option<f64>,

    pub request_headers: HashMap<String, String>,
    pub response_headers: HashMap<String, String>,

    /// Raw bodies, when the capture layer chose to keep them.
    pub request_body: Option<Vec<u8>>,
    pub response_body: Option<Vec<u8>>,

    /// Client-side failure description (timeout, DNS, TLS, ...).
    pub error: Option<String>,
}

impl RequestRecord {
    /// Start a new record for an intercepted request.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::next(),
            method: method.into(),
            url: url.into(),
            status: None,
            started_at: Timestamp::now(),
            duration_ms: None,
            request_headers: HashMap::new(),
            response_headers: HashMap::new(),
            request_body: None,
            response_body: None,
            error: None,
        }
    }
}

impl Entry for RequestRecord {
    type Id = RequestId;

    fn id(&self) -> RequestId {
        self.id
    }
}
