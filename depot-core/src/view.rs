//! Extraction views: secondary, non-versioned projections.
//!
//! An [`ExtractionView`] observes one collection and extracts named
//! fields from each resource's JSON content into its own table for
//! field-based querying. A projection row is rewritten wholesale on every
//! observed write and removed on delete; no history is kept.
//!
//! View maintenance runs after the primary transaction commits. A crash
//! between the two leaves the view stale until the entity's next write;
//! primary data is always transactionally consistent.

use serde_json::{Map, Value};

use crate::{
    backend::{TableBackend, WriteOp},
    error::StoreResult,
    query::Filter,
    row::Record,
};

/// A registered extraction view.
#[derive(Debug, Clone)]
pub struct ExtractionView {
    name: String,
    observe: String,
    extract: Vec<String>,
}

impl ExtractionView {
    /// Creates a view named `name` observing the `observe` collection and
    /// extracting the `extract` fields from JSON content.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let view = ExtractionView::new(
    ///     "item_colors",
    ///     "items",
    ///     ["color", "saturation"],
    /// );
    /// ```
    pub fn new(
        name: impl Into<String>,
        observe: impl Into<String>,
        extract: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            observe: observe.into(),
            extract: extract.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns this view's name, which is also its table and URI segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the observed collection.
    pub fn observes(&self) -> &str {
        &self.observe
    }

    /// Ensures the view's projection table exists. Called once per view
    /// when the store opens.
    pub async fn initialize_storage<B: TableBackend>(&self, backend: &B) -> StoreResult<()> {
        backend.create_table(&self.name).await
    }

    /// Projects an observed write into the view: the old row for the URI
    /// is dropped and a fresh one inserted, atomically.
    pub async fn map<B: TableBackend>(
        &self,
        backend: &B,
        collection: &str,
        uri: &str,
        data: &Value,
    ) -> StoreResult<()> {
        if self.observe != collection {
            return Ok(());
        }

        let mut record: Record = Map::new();
        record.insert("uri".to_string(), Value::from(uri));
        for field in &self.extract {
            let value = data.get(field).cloned().unwrap_or(Value::Null);
            record.insert(field.clone(), value);
        }
        record.insert("content".to_string(), Value::from(data.to_string()));

        backend
            .transact(
                &self.name,
                vec![
                    WriteOp::Delete { filter: Filter::new().eq("uri", uri) },
                    WriteOp::Insert(record),
                ],
            )
            .await
    }

    /// Removes an observed entity's projection row.
    pub async fn unmap<B: TableBackend>(
        &self,
        backend: &B,
        collection: &str,
        uri: &str,
    ) -> StoreResult<()> {
        if self.observe != collection {
            return Ok(());
        }
        backend
            .delete(&self.name, &Filter::new().eq("uri", uri))
            .await?;
        Ok(())
    }
}
