//! In-memory table backend for depot.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `TableBackend` trait. It uses async-aware read-write locks for
//! concurrent access and is ideal for development, testing, and
//! small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Insertion-ordered tables** - Rows are plain vectors, so listing order is free
//! - **Atomic write batches** - Transactions commit copy-on-write under the write lock
//!
//! # Quick Start
//!
//! ```ignore
//! use depot_core::store::{Store, WriteOptions};
//! use depot_memory::MemoryTable;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open(MemoryTable::new(), ["items"], vec![]).await?;
//!
//!     let response = store
//!         .put("/items/123", &WriteOptions::new(r#"{"color":"green"}"#))
//!         .await?;
//!     assert_eq!(response.status, 201);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as depot_memory;

pub mod table;

pub use table::{MemoryTable, MemoryTableBuilder};
