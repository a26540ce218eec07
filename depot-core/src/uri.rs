//! URI classification for store dispatch.
//!
//! Every store call classifies its path once into a [`ParsedUri`] and
//! matches it exhaustively. The six addressable kinds, their shapes, and
//! the fixed per-kind method tables live here; nothing else in the crate
//! re-derives shape information from path strings.

/// The meta sentinel path listing the store's registered URIs.
pub const META_URI: &str = "/depot-meta";

const VERSIONS_SEGMENT: &str = "versions";

/// Every HTTP verb the store implements.
pub const HTTP_METHODS: &[&str] = &["GET", "HEAD", "POST", "PUT", "DELETE", "OPTIONS"];

const META_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS"];
const COLLECTION_METHODS: &[&str] = &["GET", "HEAD", "POST", "OPTIONS"];
const RESOURCE_METHODS: &[&str] = &["GET", "HEAD", "PUT", "DELETE", "OPTIONS"];
const VERSION_COLLECTION_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS"];
const RESOURCE_VERSION_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS"];
const VIEW_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS"];

/// A classified URI.
///
/// Classification needs the registered collection and view names: a
/// single-segment path is a collection, a view, the meta sentinel, or
/// invalid, depending on registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedUri {
    /// `/depot-meta`
    Meta,
    /// `/{collection}`
    Collection { collection: String },
    /// `/{collection}/{id}`
    Resource { collection: String, id: String },
    /// `/{collection}/{id}/versions`
    VersionCollection { collection: String, id: String },
    /// `/{collection}/{id}/versions/{etag}`
    ResourceVersion {
        collection: String,
        id: String,
        etag: String,
    },
    /// `/{view}`
    View { view: String },
    /// The first segment names no registered collection or view. 400.
    Invalid,
    /// A known collection addressed with an unroutable shape (wrong
    /// segment count, or a third segment other than `versions`). 404.
    Unmatched,
}

impl ParsedUri {
    /// Classifies a path against the registered collection and view
    /// names.
    pub fn classify(uri: &str, collections: &[String], views: &[String]) -> ParsedUri {
        let c = components(uri);
        let known = |name: &str| collections.iter().any(|col| col == name);

        match c.as_slice() {
            [segment] if Some(*segment) == META_URI.strip_prefix('/') => ParsedUri::Meta,
            [name] if known(name) => ParsedUri::Collection { collection: name.to_string() },
            [name] if views.iter().any(|v| v == name) => ParsedUri::View { view: name.to_string() },
            [name, id] if known(name) => ParsedUri::Resource {
                collection: name.to_string(),
                id: id.to_string(),
            },
            [name, id, VERSIONS_SEGMENT] if known(name) => ParsedUri::VersionCollection {
                collection: name.to_string(),
                id: id.to_string(),
            },
            [name, id, VERSIONS_SEGMENT, etag] if known(name) => ParsedUri::ResourceVersion {
                collection: name.to_string(),
                id: id.to_string(),
                etag: etag.to_string(),
            },
            [name, ..] if known(name) || views.iter().any(|v| v == name) => ParsedUri::Unmatched,
            _ => ParsedUri::Invalid,
        }
    }

    /// Returns the allowed-method table for this URI kind, or `None` for
    /// the non-routable outcomes.
    pub fn allowed_methods(&self) -> Option<&'static [&'static str]> {
        match self {
            ParsedUri::Meta => Some(META_METHODS),
            ParsedUri::Collection { .. } => Some(COLLECTION_METHODS),
            ParsedUri::Resource { .. } => Some(RESOURCE_METHODS),
            ParsedUri::VersionCollection { .. } => Some(VERSION_COLLECTION_METHODS),
            ParsedUri::ResourceVersion { .. } => Some(RESOURCE_VERSION_METHODS),
            ParsedUri::View { .. } => Some(VIEW_METHODS),
            ParsedUri::Invalid | ParsedUri::Unmatched => None,
        }
    }
}

/// Splits a URI into its non-empty path segments.
pub fn components(uri: &str) -> Vec<&str> {
    uri.split('/').filter(|s| !s.is_empty()).collect()
}

/// Returns the collection path fragment of a URI.
///
/// Example: `collection_uri_fragment("/items/123")` => `/items`
pub fn collection_uri_fragment(uri: &str) -> Option<String> {
    components(uri)
        .first()
        .map(|c| format!("/{c}"))
}

/// Returns the canonical URI of the resource a URI addresses: the first
/// two segments.
///
/// Example: `current_resource_uri("/items/123/versions/abc")` => `/items/123`
pub fn current_resource_uri(uri: &str) -> Option<String> {
    let c = components(uri);
    match c.as_slice() {
        [collection, id, ..] => Some(format!("/{collection}/{id}")),
        _ => None,
    }
}
