//! A URI-addressed, versioned JSON document storage engine with HTTP semantics.
//!
//! This crate is the core of the depot project and provides:
//!
//! - **URI classification** ([`uri`]) - The six addressable URI kinds and their method tables
//! - **Table backend abstraction** ([`backend`]) - The trait storage adapters implement
//! - **Row model** ([`row`]) - The version-row schema shared by store and backends
//! - **Filtering** ([`query`]) - Field-equality filters for backend queries
//! - **The store** ([`store`]) - CRUD dispatch, versioning, and optimistic concurrency
//! - **Extraction views** ([`view`]) - Non-versioned field projections for secondary querying
//! - **Responses** ([`response`]) - The HTTP-shaped status/header/body results
//! - **Pagination** ([`page`]) - Listing windows and the `{total, offset, uris}` envelope
//! - **Error handling** ([`error`]) - Adapter-level error and result types
//!
//! # Example
//!
//! ```ignore
//! use depot_core::store::{Store, ListOptions, WriteOptions};
//!
//! let store = Store::open(backend, ["items"], vec![]).await?;
//!
//! let created = store
//!     .put("/items/123", &WriteOptions::new(r#"{"color":"green"}"#))
//!     .await?;
//! assert_eq!(created.status, 201);
//!
//! let fetched = store.get("/items/123", &ListOptions::new()).await?;
//! assert_eq!(fetched.etag(), created.etag());
//! ```

#[allow(unused_extern_crates)]
extern crate self as depot_core;

pub mod backend;
pub mod error;
pub mod page;
pub mod query;
pub mod response;
pub mod row;
pub mod store;
pub mod uri;
pub mod view;
