//! Error types for the capture store.

use thiserror::Error;

/// Main error type for store operations.
///
/// Mutation and observation are total functions over in-memory state, so
/// almost nothing here can fail; the only fallible surface is construction.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
