//! Error types and result types for store operations.
//!
//! Only adapter-level failures surface as errors. Every HTTP-taxonomy
//! outcome (404, 410, 412, 422, ...) is an ordinary [`Response`](crate::response::Response)
//! returned from the store; callers should treat an `Err` from any store
//! operation as an internal (500-class) failure.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents the failures that can occur below the store's HTTP-shaped
/// surface: backend faults, serialization problems, and aborted
/// transactions.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting rows or records.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The requested table does not exist in the backend.
    #[error("Table not found: {0}")]
    TableNotFound(String),
    /// A record violates the backend's relation shape.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    /// A transactional write batch was rolled back because a strict
    /// update matched no rows. The store maps this to 412 on the
    /// optimistic-concurrency path.
    #[error("Transaction conflict in table {0}")]
    Conflict(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
