//! Convenient re-exports of commonly used types from depot.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use depot::prelude::*;
//! ```
//!
//! This provides access to:
//! - The store and its per-operation option types
//! - Backend traits and write operations
//! - URI classification
//! - Extraction views, responses, and pagination
//! - Error types

pub use depot_core::{
    backend::{TableBackend, TableBackendBuilder, WriteOp},
    error::{StoreError, StoreResult},
    page::{Pagination, UriList},
    query::Filter,
    response::Response,
    row::{Record, Row},
    store::{DeleteOptions, ListOptions, Store, WriteOptions, STORE_TABLE},
    uri::{ParsedUri, HTTP_METHODS, META_URI},
    view::ExtractionView,
};
