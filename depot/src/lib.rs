//! Main depot crate providing a URI-addressed, versioned JSON document
//! storage engine with HTTP semantics.
//!
//! This crate is the primary entry point for users of the depot
//! framework. It re-exports the core types from the sub-crates and
//! provides convenient access to the storage backends.
//!
//! # Features
//!
//! - **URI-addressed resources** - Every resource and every historical
//!   version has a stable URI; URI shape determines the allowed verbs
//! - **Automatic versioning** - Updates archive the replaced version
//!   under `{uri}/versions/{etag}`; deletes leave a tombstone
//! - **Optimistic concurrency** - Updates and deletes require the
//!   caller's last-observed etag and answer 412 when it is stale
//! - **Extraction views** - Non-versioned field projections for
//!   querying resources by content
//! - **Pluggable backends** - Any adapter exposing named tables of flat
//!   JSON records via the `TableBackend` trait
//!
//! # Quick Start
//!
//! ```ignore
//! use depot::{prelude::*, memory::MemoryTable};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let view = ExtractionView::new("item_colors", "items", ["color"]);
//!     let store = Store::open(MemoryTable::new(), ["items"], vec![view]).await?;
//!
//!     // Create at a caller-chosen URI.
//!     let created = store
//!         .put("/items/123", &WriteOptions::new(r#"{"color":"green"}"#))
//!         .await?;
//!     assert_eq!(created.status, 201);
//!
//!     // Updates require the last-observed etag.
//!     let updated = store
//!         .put(
//!             "/items/123",
//!             &WriteOptions::new(r#"{"color":"blue"}"#)
//!                 .etag(created.etag().unwrap()),
//!         )
//!         .await?;
//!     assert_eq!(updated.status, 200);
//!
//!     // The replaced version stays addressable.
//!     let versions = store.get("/items/123/versions", &ListOptions::new()).await?;
//!     assert_eq!(versions.parsed_content()?["total"], 2);
//!
//!     // Query by extracted field.
//!     let blue = store
//!         .get("/item_colors", &ListOptions::new().filter("color", "blue"))
//!         .await?;
//!     assert_eq!(blue.parsed_content()?["total"], 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing

pub mod prelude;

pub use depot_core::{backend, error, page, query, response, row, store, uri, view};

/// In-memory storage backend implementations.
pub mod memory {
    pub use depot_memory::{MemoryTable, MemoryTableBuilder};
}
