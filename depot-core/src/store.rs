//! The store: URI-addressed, versioned CRUD with HTTP semantics.
//!
//! A [`Store`] owns a [`TableBackend`], a fixed set of collection names,
//! and the registered extraction views. Each operation classifies its URI
//! once, dispatches on the resulting [`ParsedUri`], and returns an
//! HTTP-shaped [`Response`]; adapter failures are the only `Err` case.
//!
//! Every resource is automatically versioned: an update archives the
//! current row under `{uri}/versions/{old_etag}` and inserts the
//! replacement at the canonical URI inside one backend transaction, so
//! readers never observe the resource half-moved. Deletes archive the
//! same way and leave a tombstone at the canonical URI.
//!
//! # Example
//!
//! ```ignore
//! use depot_core::{store::{Store, WriteOptions}, view::ExtractionView};
//!
//! let view = ExtractionView::new("item_colors", "items", ["color"]);
//! let store = Store::open(backend, ["items"], vec![view]).await?;
//!
//! let response = store
//!     .put("/items/123", &WriteOptions::new(r#"{"color":"green"}"#))
//!     .await?;
//! assert_eq!(response.status, 201);
//! ```

use chrono::Utc;
use serde_json::Value;
use sha1::{Digest, Sha1};
use tracing::debug;
use uuid::Uuid;

use crate::{
    backend::{TableBackend, WriteOp},
    error::{StoreError, StoreResult},
    page::{Pagination, UriList},
    query::Filter,
    response::Response,
    row::{Record, Row},
    uri::{HTTP_METHODS, ParsedUri},
    view::ExtractionView,
};

/// The backing table holding every version row of every collection.
pub const STORE_TABLE: &str = "depot_store";

/// Parameters accepted by [`Store::get`] and [`Store::head`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Scopes the dataset to one owner when provided.
    pub remote_user: Option<String>,
    /// 0-based listing offset.
    pub offset: Option<usize>,
    /// Maximum number of listing entries returned.
    pub limit: Option<usize>,
    /// Extra field-equality conditions, applied to view queries.
    pub filters: Vec<(String, Value)>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote_user(mut self, remote_user: impl Into<String>) -> Self {
        self.remote_user = Some(remote_user.into());
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }
}

/// Parameters accepted by [`Store::put`] and [`Store::post`].
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// The JSON payload. Validated, then stored verbatim.
    pub json: String,
    /// Owner identity recorded on the written version.
    pub remote_user: Option<String>,
    /// The etag last observed by the caller. Required when updating.
    pub etag: Option<String>,
}

impl WriteOptions {
    pub fn new(json: impl Into<String>) -> Self {
        Self {
            json: json.into(),
            remote_user: None,
            etag: None,
        }
    }

    pub fn remote_user(mut self, remote_user: impl Into<String>) -> Self {
        self.remote_user = Some(remote_user.into());
        self
    }

    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// Parameters accepted by [`Store::delete`].
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Caller identity; must match the stored owner.
    pub remote_user: Option<String>,
    /// The etag last observed by the caller. Required.
    pub etag: Option<String>,
}

impl DeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remote_user(mut self, remote_user: impl Into<String>) -> Self {
        self.remote_user = Some(remote_user.into());
        self
    }

    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// A functional storage interface with HTTP semantics over a pluggable
/// table backend. All resources are automatically versioned.
#[derive(Debug)]
pub struct Store<B: TableBackend> {
    backend: B,
    collections: Vec<String>,
    views: Vec<ExtractionView>,
    view_names: Vec<String>,
}

impl<B: TableBackend> Store<B> {
    /// Opens a store over `backend` managing the given collections and
    /// views. View projection tables are ensured here, once.
    pub async fn open(
        backend: B,
        collections: impl IntoIterator<Item = impl Into<String>>,
        views: Vec<ExtractionView>,
    ) -> StoreResult<Self> {
        let view_names = views
            .iter()
            .map(|view| view.name().to_string())
            .collect();
        let store = Self {
            backend,
            collections: collections
                .into_iter()
                .map(Into::into)
                .collect(),
            views,
            view_names,
        };
        for view in &store.views {
            view.initialize_storage(&store.backend)
                .await?;
        }
        Ok(store)
    }

    /// Retrieves a resource or collection of resources by URI.
    ///
    /// ## URI kinds
    ///
    /// ```text
    /// /depot-meta
    /// /{collection}
    /// /{collection}/{id}
    /// /{collection}/{id}/versions
    /// /{collection}/{id}/versions/{etag}
    /// /{view}
    /// ```
    pub async fn get(&self, uri: &str, options: &ListOptions) -> StoreResult<Response> {
        match self.classify(uri) {
            ParsedUri::Meta => Ok(self.meta()),
            ParsedUri::Collection { collection } => {
                self.resource_collection(&collection, options)
                    .await
            }
            ParsedUri::Resource { collection, id } => {
                self.resource(&canonical_uri(&collection, &id), options)
                    .await
            }
            ParsedUri::VersionCollection { collection, id } => {
                self.version_collection(&canonical_uri(&collection, &id), options)
                    .await
            }
            ParsedUri::ResourceVersion { collection, id, etag } => {
                self.resource_version(&version_uri(&canonical_uri(&collection, &id), &etag), options)
                    .await
            }
            ParsedUri::View { view } => self.view(&view, options).await,
            ParsedUri::Invalid => Ok(Response::invalid_entity_type()),
            ParsedUri::Unmatched => Ok(Response::not_found()),
        }
    }

    /// Retrieves the same items as [`Store::get`], minus the body.
    ///
    /// Single-resource shapes fetch only `{etag, last_modified, deleted}`
    /// since those are stored on write; collection shapes delegate to
    /// `get` and strip the body.
    pub async fn head(&self, uri: &str, options: &ListOptions) -> StoreResult<Response> {
        let target = match self.classify(uri) {
            ParsedUri::Resource { collection, id } => canonical_uri(&collection, &id),
            ParsedUri::ResourceVersion { collection, id, etag } => {
                version_uri(&canonical_uri(&collection, &id), &etag)
            }
            _ => return Ok(self.get(uri, options).await?.head()),
        };

        let filter = Filter::new()
            .eq("uri", target.as_str())
            .maybe_eq("remote_user", options.remote_user.clone());
        let found = self
            .backend
            .query_fields(STORE_TABLE, &filter, &["etag", "last_modified", "deleted"])
            .await?;
        match found.into_iter().next() {
            Some(meta) => {
                if meta.get("deleted").and_then(Value::as_bool) == Some(true) {
                    return Ok(Response::gone().head());
                }
                Ok(Response::json(
                    200,
                    "",
                    meta.get("etag").and_then(Value::as_str),
                    meta.get("last_modified").and_then(Value::as_str),
                ))
            }
            None => Ok(Response::not_found().head()),
        }
    }

    /// Creates a resource in a collection under a system-generated id.
    /// Always creates; never updates.
    pub async fn post(&self, uri: &str, options: &WriteOptions) -> StoreResult<Response> {
        let parsed = self.classify(uri);
        match parsed {
            ParsedUri::Collection { collection } => {
                let id = Uuid::new_v4().to_string();
                self.create_resource(&canonical_uri(&collection, &id), &collection, options)
                    .await
            }
            other => Ok(self.write_rejection(other, "POST")),
        }
    }

    /// Updates or creates the resource at a canonical URI. Updating an
    /// existing resource requires the caller's last-observed etag.
    pub async fn put(&self, uri: &str, options: &WriteOptions) -> StoreResult<Response> {
        let parsed = self.classify(uri);
        match parsed {
            ParsedUri::Resource { collection, id } => {
                let canonical = canonical_uri(&collection, &id);
                // Existence probe only: etag and remote_user are
                // deliberately excluded here. Ownership is enforced on
                // the update path, and a tombstone counts as absent.
                let found = self
                    .backend
                    .query(STORE_TABLE, &Filter::new().eq("uri", canonical.as_str()))
                    .await?;
                match found.into_iter().next() {
                    Some(record) => {
                        let current = Row::from_record(record)?;
                        if current.deleted {
                            self.create_resource(&canonical, &collection, options)
                                .await
                        } else {
                            self.update_resource(&canonical, &collection, current, options)
                                .await
                        }
                    }
                    None => {
                        self.create_resource(&canonical, &collection, options)
                            .await
                    }
                }
            }
            other => Ok(self.write_rejection(other, "PUT")),
        }
    }

    /// Soft-deletes the resource at a canonical URI, archiving the
    /// current version and leaving a tombstone. Requires the caller's
    /// last-observed etag.
    pub async fn delete(&self, uri: &str, options: &DeleteOptions) -> StoreResult<Response> {
        let parsed = self.classify(uri);
        let (collection, canonical) = match parsed {
            ParsedUri::Resource { collection, id } => {
                let canonical = canonical_uri(&collection, &id);
                (collection, canonical)
            }
            other => return Ok(self.write_rejection(other, "DELETE")),
        };

        let Some(supplied_etag) = options.etag.as_deref() else {
            return Ok(Response::etag_required());
        };

        let found = self
            .backend
            .query(STORE_TABLE, &Filter::new().eq("uri", canonical.as_str()))
            .await?;
        let Some(record) = found.into_iter().next() else {
            return Ok(Response::not_found());
        };
        let current = Row::from_record(record)?;

        // Ownership mismatch is indistinguishable from absence.
        if current.remote_user != options.remote_user {
            return Ok(Response::not_found());
        }
        if current.deleted {
            return Ok(Response::gone());
        }
        let Some(current_etag) = current.etag.clone() else {
            return Ok(Response::gone());
        };
        if supplied_etag != current_etag {
            return Ok(Response::precondition_failed());
        }

        let archived_uri = version_uri(&canonical, &current_etag);
        let tombstone = Row {
            uri: canonical.clone(),
            collection_reference: current.collection_reference.clone(),
            resource_reference: current.resource_reference.clone(),
            etag: None,
            last_modified: None,
            remote_user: current.remote_user.clone(),
            content: current.content.clone(),
            deleted: true,
        };
        let archive = WriteOp::Update {
            filter: Filter::new()
                .eq("uri", canonical.as_str())
                .eq("etag", current_etag.as_str()),
            changes: single_change("uri", archived_uri.as_str()),
        };
        match self
            .backend
            .transact(STORE_TABLE, vec![archive, WriteOp::Insert(tombstone.into_record()?)])
            .await
        {
            Ok(()) => {}
            // Lost a concurrent race after the lookup above.
            Err(StoreError::Conflict(_)) => return Ok(Response::precondition_failed()),
            Err(err) => return Err(err),
        }

        self.unmap_views(&collection, &canonical).await?;
        debug!(uri = canonical.as_str(), "deleted resource");
        Ok(Response::json_meta(
            200,
            &archived_uri,
            Some(&current_etag),
            current.last_modified.as_deref(),
        ))
    }

    /// Builds a response carrying the allowed-method set for a URI.
    pub async fn options(&self, uri: &str) -> StoreResult<Response> {
        let parsed = self.classify(uri);
        match parsed.allowed_methods() {
            Some(methods) => Ok(Response::allow(methods)),
            None if parsed == ParsedUri::Invalid => Ok(Response::invalid_entity_type()),
            None => Ok(Response::not_found()),
        }
    }

    /// Returns the allowed-method set for a URI, or `None` when the URI
    /// is not routable.
    pub fn methods_for_uri(&self, uri: &str) -> Option<&'static [&'static str]> {
        self.classify(uri).allowed_methods()
    }

    /// Returns true if the store handles the given HTTP verb at all.
    /// Transports short-circuit unsupported verbs to 501 with this.
    pub fn implements(&self, http_method: &str) -> bool {
        HTTP_METHODS
            .iter()
            .any(|method| method.eq_ignore_ascii_case(http_method))
    }

    /// Clears all contents of the store. Test teardown only.
    pub async fn reset(&self) -> StoreResult<()> {
        self.backend.clear().await
    }

    fn classify(&self, uri: &str) -> ParsedUri {
        ParsedUri::classify(uri, &self.collections, &self.view_names)
    }

    /// Lists every registered collection and view URI.
    fn meta(&self) -> Response {
        let uris: Vec<String> = self
            .collections
            .iter()
            .chain(self.view_names.iter())
            .map(|name| format!("/{name}"))
            .collect();
        let body = serde_json::json!({ "uris": uris }).to_string();
        let etag = body_etag(&body);
        Response::json(200, body, Some(&etag), None)
    }

    /// Lists current-version URIs in a collection, newest first.
    async fn resource_collection(
        &self,
        collection: &str,
        options: &ListOptions,
    ) -> StoreResult<Response> {
        let filter = Filter::new()
            .eq("collection_reference", format!("/{collection}"))
            .eq("deleted", false)
            .maybe_eq("remote_user", options.remote_user.clone());
        let mut rows = self.backend.query(STORE_TABLE, &filter).await?;
        // Current versions only: the row at the canonical URI.
        rows.retain(|record| record.get("uri") == record.get("resource_reference"));
        rows.reverse();
        self.bundle_uri_list(rows, options)
    }

    /// Returns a single resource's content, or 410 for a tombstone.
    async fn resource(&self, canonical: &str, options: &ListOptions) -> StoreResult<Response> {
        let filter = Filter::new()
            .eq("uri", canonical)
            .maybe_eq("remote_user", options.remote_user.clone());
        let found = self.backend.query(STORE_TABLE, &filter).await?;
        match found.into_iter().next() {
            Some(record) => {
                let row = Row::from_record(record)?;
                if row.deleted {
                    return Ok(Response::gone());
                }
                Ok(Response::json(
                    200,
                    row.content,
                    row.etag.as_deref(),
                    row.last_modified.as_deref(),
                ))
            }
            None => Ok(Response::not_found()),
        }
    }

    /// Lists every version URI of a resource, current version included,
    /// newest first. Tombstones are not listed.
    async fn version_collection(
        &self,
        canonical: &str,
        options: &ListOptions,
    ) -> StoreResult<Response> {
        let probe = Filter::new()
            .eq("uri", canonical)
            .maybe_eq("remote_user", options.remote_user.clone());
        let found = self
            .backend
            .query_fields(STORE_TABLE, &probe, &["uri"])
            .await?;
        if found.is_empty() {
            return Ok(Response::not_found());
        }

        let filter = Filter::new()
            .eq("resource_reference", canonical)
            .eq("deleted", false)
            .maybe_eq("remote_user", options.remote_user.clone());
        let mut rows = self.backend.query(STORE_TABLE, &filter).await?;
        rows.reverse();
        self.bundle_uri_list(rows, options)
    }

    /// Returns one archived version by its version URI.
    async fn resource_version(&self, uri: &str, options: &ListOptions) -> StoreResult<Response> {
        let filter = Filter::new()
            .eq("uri", uri)
            .maybe_eq("remote_user", options.remote_user.clone());
        let found = self.backend.query(STORE_TABLE, &filter).await?;
        match found.into_iter().next() {
            Some(record) => {
                let row = Row::from_record(record)?;
                Ok(Response::json(
                    200,
                    row.content,
                    row.etag.as_deref(),
                    row.last_modified.as_deref(),
                ))
            }
            None => Ok(Response::not_found()),
        }
    }

    /// Queries a view's projection table with the caller's extra filters.
    async fn view(&self, view: &str, options: &ListOptions) -> StoreResult<Response> {
        let mut filter = Filter::new();
        for (field, value) in &options.filters {
            filter = filter.eq(field.clone(), value.clone());
        }
        let rows = self.backend.query(view, &filter).await?;
        self.bundle_uri_list(rows, options)
    }

    /// Inserts a brand-new current version at `canonical`. Any tombstone
    /// occupying the canonical URI is dropped in the same transaction so
    /// exactly one row holds the canonical address.
    async fn create_resource(
        &self,
        canonical: &str,
        collection: &str,
        options: &WriteOptions,
    ) -> StoreResult<Response> {
        let data: Value = match serde_json::from_str(&options.json) {
            Ok(data) => data,
            Err(_) => return Ok(Response::unprocessable()),
        };
        let etag = Uuid::new_v4().to_string();
        let last_modified = timestamp();
        let row = Row {
            uri: canonical.to_string(),
            collection_reference: format!("/{collection}"),
            resource_reference: canonical.to_string(),
            etag: Some(etag.clone()),
            last_modified: Some(last_modified.clone()),
            remote_user: options.remote_user.clone(),
            content: options.json.clone(),
            deleted: false,
        };
        let drop_tombstone = WriteOp::Delete {
            filter: Filter::new()
                .eq("uri", canonical)
                .eq("deleted", true),
        };
        self.backend
            .transact(STORE_TABLE, vec![drop_tombstone, WriteOp::Insert(row.into_record()?)])
            .await?;

        self.map_views(collection, canonical, &data)
            .await?;
        debug!(uri = canonical, etag = etag.as_str(), "created resource");
        Ok(Response::json_meta(201, canonical, Some(&etag), Some(&last_modified)))
    }

    /// Archives the current version and installs the replacement, both
    /// inside one backend transaction keyed on the observed etag.
    async fn update_resource(
        &self,
        canonical: &str,
        collection: &str,
        current: Row,
        options: &WriteOptions,
    ) -> StoreResult<Response> {
        let data: Value = match serde_json::from_str(&options.json) {
            Ok(data) => data,
            Err(_) => return Ok(Response::unprocessable()),
        };

        // Ownership mismatch is indistinguishable from absence, and is
        // reported before the missing-etag case.
        if current.remote_user != options.remote_user {
            return Ok(Response::not_found());
        }
        let Some(supplied_etag) = options.etag.as_deref() else {
            return Ok(Response::etag_required());
        };
        let Some(current_etag) = current.etag.clone() else {
            return Ok(Response::gone());
        };
        if supplied_etag != current_etag {
            return Ok(Response::precondition_failed());
        }

        let etag = Uuid::new_v4().to_string();
        let last_modified = timestamp();
        let replacement = Row {
            uri: canonical.to_string(),
            collection_reference: current.collection_reference.clone(),
            resource_reference: current.resource_reference.clone(),
            etag: Some(etag.clone()),
            last_modified: Some(last_modified.clone()),
            remote_user: options.remote_user.clone(),
            content: options.json.clone(),
            deleted: false,
        };
        let archived_uri = version_uri(canonical, &current_etag);
        let archive = WriteOp::Update {
            filter: Filter::new()
                .eq("uri", canonical)
                .eq("etag", current_etag.as_str()),
            changes: single_change("uri", archived_uri.as_str()),
        };
        match self
            .backend
            .transact(STORE_TABLE, vec![archive, WriteOp::Insert(replacement.into_record()?)])
            .await
        {
            Ok(()) => {}
            // Another writer archived this version first.
            Err(StoreError::Conflict(_)) => return Ok(Response::precondition_failed()),
            Err(err) => return Err(err),
        }

        self.map_views(collection, canonical, &data)
            .await?;
        debug!(uri = canonical, etag = etag.as_str(), "updated resource");
        Ok(Response::json_meta(200, canonical, Some(&etag), Some(&last_modified)))
    }

    /// Windows listing rows into the `{total, offset, uris}` envelope.
    /// Rows arrive newest-first; the envelope's `Last-Modified` is the
    /// newest row's timestamp and its ETag is a hash of the body.
    fn bundle_uri_list(&self, rows: Vec<Record>, options: &ListOptions) -> StoreResult<Response> {
        let last_modified = rows
            .first()
            .and_then(|record| record.get("last_modified"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let uris = rows
            .into_iter()
            .filter_map(|record| match record.get("uri") {
                Some(Value::String(uri)) => Some(uri.clone()),
                _ => None,
            })
            .collect();
        let list = UriList::paginate(uris, &Pagination::new(options.offset, options.limit));
        let body = serde_json::to_string(&list)?;
        let etag = body_etag(&body);
        Ok(Response::json(200, body, Some(&etag), last_modified.as_deref()))
    }

    /// Shapes the rejection for a write verb aimed at the wrong URI kind.
    fn write_rejection(&self, parsed: ParsedUri, verb: &str) -> Response {
        match parsed.allowed_methods() {
            Some(methods) if !methods.contains(&verb) => Response::method_not_allowed(methods),
            Some(_) => Response::invalid_entity_type(),
            None if parsed == ParsedUri::Unmatched => Response::not_found(),
            None => Response::invalid_entity_type(),
        }
    }

    async fn map_views(&self, collection: &str, uri: &str, data: &Value) -> StoreResult<()> {
        for view in &self.views {
            view.map(&self.backend, collection, uri, data)
                .await?;
        }
        Ok(())
    }

    async fn unmap_views(&self, collection: &str, uri: &str) -> StoreResult<()> {
        for view in &self.views {
            view.unmap(&self.backend, collection, uri)
                .await?;
        }
        Ok(())
    }
}

/// Builds the canonical URI for a resource.
fn canonical_uri(collection: &str, id: &str) -> String {
    format!("/{collection}/{id}")
}

/// Builds the archive URI for a version of a resource.
fn version_uri(canonical: &str, etag: &str) -> String {
    format!("{canonical}/versions/{etag}")
}

/// A one-field change set for [`WriteOp::Update`].
fn single_change(field: &str, value: &str) -> Record {
    let mut changes = Record::new();
    changes.insert(field.to_string(), Value::from(value));
    changes
}

/// ETag for collection bodies. Single resources store their etags on
/// write; listings hash their body on read instead.
fn body_etag(body: &str) -> String {
    hex::encode(Sha1::digest(body.as_bytes()))
}

/// An HTTP-format timestamp for "now".
fn timestamp() -> String {
    Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}
