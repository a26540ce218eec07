//! Storage backend abstraction for the backing tables.
//!
//! This module defines the trait that abstracts over relational-style
//! storage engines, allowing the store to run against different adapters
//! (in-memory, SQL, document-store-backed) as long as they expose the
//! same relation shape: named tables of flat JSON records.
//!
//! # Overview
//!
//! [`TableBackend`] provides filtered selects, inserts, updates, deletes,
//! and a single enclosing transaction per mutation via [`TableBackend::transact`].
//! Implementations are required to be thread-safe (`Send + Sync`) and to
//! preserve **insertion order** in query results; the store relies on
//! that order for reverse-chronological listings.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::StoreResult,
    query::Filter,
    row::Record,
};

/// One step of a transactional write batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Append a record to the table.
    Insert(Record),
    /// Merge `changes` into every record matching `filter`.
    ///
    /// Strict: if the filter matches no records the whole batch must be
    /// rolled back with [`StoreError::Conflict`](crate::error::StoreError::Conflict).
    /// This is the commit-time etag check on the archive step of an
    /// update or delete.
    Update { filter: Filter, changes: Record },
    /// Remove every record matching `filter`. Matching nothing is not an
    /// error.
    Delete { filter: Filter },
}

/// Abstract interface over a single storage engine.
///
/// Tables are created on demand by writes (and explicitly via
/// [`TableBackend::create_table`] for view projections). Records are
/// untyped; the store layers its row model on top.
///
/// # Thread Safety
///
/// All implementations must support concurrent access from multiple
/// async tasks. [`TableBackend::transact`] must be atomic with respect to
/// every other operation: no reader may observe a partially applied
/// batch, and a failed batch must leave the table untouched.
#[async_trait]
pub trait TableBackend: Send + Sync + Debug {
    /// Appends a record to a table, creating the table if needed.
    async fn insert(&self, table: &str, record: Record) -> StoreResult<()>;

    /// Returns every record matching the filter, in insertion order.
    ///
    /// Querying a table that does not exist returns an empty result.
    async fn query(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>>;

    /// Returns the named fields of every record matching the filter, in
    /// insertion order. Fields absent from a record are omitted.
    ///
    /// This exists so metadata probes (HEAD) avoid materializing content.
    async fn query_fields(
        &self,
        table: &str,
        filter: &Filter,
        fields: &[&str],
    ) -> StoreResult<Vec<Record>>;

    /// Merges `changes` into every record matching the filter. Returns
    /// the number of records touched.
    async fn update(&self, table: &str, filter: &Filter, changes: Record) -> StoreResult<usize>;

    /// Removes every record matching the filter. Returns the number of
    /// records removed.
    async fn delete(&self, table: &str, filter: &Filter) -> StoreResult<usize>;

    /// Applies a batch of write operations atomically.
    ///
    /// Either every operation is applied, in order, or none is. A strict
    /// [`WriteOp::Update`] matching no records aborts the batch with
    /// [`StoreError::Conflict`](crate::error::StoreError::Conflict).
    async fn transact(&self, table: &str, ops: Vec<WriteOp>) -> StoreResult<()>;

    /// Ensures a table exists. Idempotent.
    async fn create_table(&self, name: &str) -> StoreResult<()>;

    /// Removes every record from every table. Test teardown only.
    async fn clear(&self) -> StoreResult<()>;
}

#[async_trait]
impl<B> TableBackend for &B
where
    B: TableBackend,
{
    async fn insert(&self, table: &str, record: Record) -> StoreResult<()> {
        (*self).insert(table, record).await
    }

    async fn query(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        (*self).query(table, filter).await
    }

    async fn query_fields(
        &self,
        table: &str,
        filter: &Filter,
        fields: &[&str],
    ) -> StoreResult<Vec<Record>> {
        (*self)
            .query_fields(table, filter, fields)
            .await
    }

    async fn update(&self, table: &str, filter: &Filter, changes: Record) -> StoreResult<usize> {
        (*self)
            .update(table, filter, changes)
            .await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> StoreResult<usize> {
        (*self).delete(table, filter).await
    }

    async fn transact(&self, table: &str, ops: Vec<WriteOp>) -> StoreResult<()> {
        (*self).transact(table, ops).await
    }

    async fn create_table(&self, name: &str) -> StoreResult<()> {
        (*self).create_table(name).await
    }

    async fn clear(&self) -> StoreResult<()> {
        (*self).clear().await
    }
}

/// Factory trait for constructing backend instances.
#[async_trait]
pub trait TableBackendBuilder {
    type Backend: TableBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
