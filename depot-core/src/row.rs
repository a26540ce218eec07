//! The versioned row model backing every resource.
//!
//! One physical row exists per *version* of a resource. The current
//! version occupies the resource's canonical URI; archived versions are
//! rewritten to `{canonical}/versions/{etag}` and never touched again.
//! A tombstone is a current-version row flagged `deleted` with no etag or
//! timestamp of its own.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, from_value, to_value};

use crate::error::{StoreError, StoreResult};

/// A flat JSON record as it crosses the backend boundary.
///
/// Both primary rows and view projection rows travel in this shape, so a
/// single generic adapter serves every table.
pub type Record = Map<String, Value>;

/// One backing-table record: a single version of a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Row {
    /// Canonical address of this version. Equals `resource_reference` for
    /// the current version; rewritten to a `.../versions/{etag}` path on
    /// archive.
    pub uri: String,
    /// The owning collection path fragment, e.g. `/items`. Invariant
    /// across a resource's whole lineage.
    pub collection_reference: String,
    /// The resource's canonical URI, shared by every version row of that
    /// resource. This is the lineage key.
    pub resource_reference: String,
    /// Optimistic-concurrency token, generated fresh on every
    /// create/update. `None` only on tombstone rows.
    pub etag: Option<String>,
    /// HTTP-format timestamp set on create/update. `None` only on
    /// tombstone rows.
    pub last_modified: Option<String>,
    /// Owner identity, enforced on update/delete. `None` for anonymous
    /// resources.
    pub remote_user: Option<String>,
    /// The raw JSON payload. Opaque to the store.
    pub content: String,
    /// Marks a tombstone at the canonical URI.
    pub deleted: bool,
}

impl Row {
    /// Converts this row into a flat record for the backend.
    pub fn into_record(self) -> StoreResult<Record> {
        match to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::InvalidRecord(other.to_string())),
        }
    }

    /// Rebuilds a row from a backend record.
    pub fn from_record(record: Record) -> StoreResult<Self> {
        Ok(from_value(Value::Object(record))?)
    }
}
