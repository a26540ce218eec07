//! In-memory table backend.
//!
//! Tables are plain `Vec<Record>`s behind one async-aware read-write
//! lock, so insertion order falls out of the representation and the
//! whole map can be snapshotted under the write lock for transactional
//! batches.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use mea::rwlock::RwLock;
use tracing::trace;

use depot_core::{
    backend::{TableBackend, TableBackendBuilder, WriteOp},
    error::{StoreError, StoreResult},
    query::Filter,
    row::Record,
};

type Table = Vec<Record>;
type TableMap = HashMap<String, Table>;

/// Thread-safe in-memory table backend.
///
/// This struct implements the [`TableBackend`] trait entirely in memory.
/// Queries scan the whole table, which is fine for development, testing,
/// and small datasets; larger deployments want a persistent adapter.
///
/// # Thread Safety
///
/// `MemoryTable` is cloneable and uses an `Arc`-wrapped internal state,
/// allowing it to be safely shared across async tasks. Multiple clones of
/// the same instance share the same underlying data. Transactional
/// batches hold the write lock for their whole duration, so no reader
/// observes a half-applied batch.
///
/// # Example
///
/// ```ignore
/// use depot_memory::MemoryTable;
/// use depot_core::{backend::TableBackend, query::Filter};
///
/// let backend = MemoryTable::new();
/// backend.insert("depot_store", record).await?;
/// let rows = backend.query("depot_store", &Filter::new()).await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct MemoryTable {
    tables: Arc<RwLock<TableMap>>,
}

impl MemoryTable {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(TableMap::new())),
        }
    }

    /// Creates a builder for constructing a `MemoryTable`.
    pub fn builder() -> MemoryTableBuilder {
        MemoryTableBuilder::default()
    }
}

/// Applies one batch step to a table working copy.
///
/// A strict update matching nothing aborts the batch; the caller throws
/// the working copy away, which is the rollback.
fn apply(table: &mut Table, op: WriteOp, name: &str) -> StoreResult<()> {
    match op {
        WriteOp::Insert(record) => table.push(record),
        WriteOp::Update { filter, changes } => {
            let mut touched = 0;
            for record in table.iter_mut() {
                if !filter.matches(record) {
                    continue;
                }
                for (field, value) in &changes {
                    record.insert(field.clone(), value.clone());
                }
                touched += 1;
            }
            if touched == 0 {
                return Err(StoreError::Conflict(name.to_string()));
            }
        }
        WriteOp::Delete { filter } => table.retain(|record| !filter.matches(record)),
    }
    Ok(())
}

#[async_trait]
impl TableBackend for MemoryTable {
    async fn insert(&self, table: &str, record: Record) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .push(record);

        Ok(())
    }

    async fn query(&self, table: &str, filter: &Filter) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let rows = match tables.get(table) {
            Some(rows) => rows,
            None => return Ok(vec![]),
        };

        Ok(rows
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    async fn query_fields(
        &self,
        table: &str,
        filter: &Filter,
        fields: &[&str],
    ) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read().await;
        let rows = match tables.get(table) {
            Some(rows) => rows,
            None => return Ok(vec![]),
        };

        Ok(rows
            .iter()
            .filter(|record| filter.matches(record))
            .map(|record| {
                let mut projected = Record::new();
                for field in fields {
                    if let Some(value) = record.get(*field) {
                        projected.insert(field.to_string(), value.clone());
                    }
                }
                projected
            })
            .collect())
    }

    async fn update(&self, table: &str, filter: &Filter, changes: Record) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        let rows = match tables.get_mut(table) {
            Some(rows) => rows,
            None => return Ok(0),
        };

        let mut touched = 0;
        for record in rows.iter_mut() {
            if !filter.matches(record) {
                continue;
            }
            for (field, value) in &changes {
                record.insert(field.clone(), value.clone());
            }
            touched += 1;
        }

        Ok(touched)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        let rows = match tables.get_mut(table) {
            Some(rows) => rows,
            None => return Ok(0),
        };

        let before = rows.len();
        rows.retain(|record| !filter.matches(record));

        Ok(before - rows.len())
    }

    async fn transact(&self, table: &str, ops: Vec<WriteOp>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        // Work on a copy; commit by swapping it in only if every step
        // applied.
        let mut working = tables
            .get(table)
            .cloned()
            .unwrap_or_default();
        let steps = ops.len();
        for op in ops {
            apply(&mut working, op, table)?;
        }
        tables.insert(table.to_string(), working);

        trace!(table, steps, "committed write batch");
        Ok(())
    }

    async fn create_table(&self, name: &str) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        for rows in tables.values_mut() {
            rows.clear();
        }

        Ok(())
    }
}

/// Builder for constructing [`MemoryTable`] instances.
///
/// Currently a no-op builder, but it keeps construction uniform with
/// adapters that need real setup.
#[derive(Default)]
pub struct MemoryTableBuilder;

#[async_trait]
impl TableBackendBuilder for MemoryTableBuilder {
    type Backend = MemoryTable;

    async fn build(self) -> StoreResult<Self::Backend> {
        Ok(MemoryTable::new())
    }
}
