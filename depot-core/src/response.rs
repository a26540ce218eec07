//! HTTP-shaped responses returned by every store operation.
//!
//! A [`Response`] is a status/header/body triple plus the constructors
//! for the store's canonical bodies: the write-metadata envelope
//! (`{ok, uri, etag, last_modified}`), the fixed error bodies
//! (`{"error": "..."}`), and the `Allow` response for OPTIONS.
//!
//! `Content-Type: application/json` is always set. `ETag` and
//! `Last-Modified` are set only where single-resource caching semantics
//! apply; metadata and error responses disable caching outright.

use serde_json::{Value, json};
use std::collections::BTreeMap;

use crate::error::StoreResult;

/// A status/header/body triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Numeric HTTP status.
    pub status: u16,
    /// Response headers. Ordered for deterministic serialization.
    pub headers: BTreeMap<String, String>,
    /// Response body, empty for HEAD-shaped responses.
    pub body: String,
}

impl Response {
    /// Builds a JSON response. `etag` is quoted into the `ETag` header;
    /// `last_modified` passes through as `Last-Modified`.
    pub fn json(
        status: u16,
        body: impl Into<String>,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Response {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Cache-Control".to_string(), "proxy-revalidate".to_string());
        if let Some(etag) = etag {
            headers.insert("ETag".to_string(), format!("\"{etag}\""));
        }
        if let Some(last_modified) = last_modified {
            headers.insert("Last-Modified".to_string(), last_modified.to_string());
        }
        Response { status, headers, body: body.into() }
    }

    /// Builds the write-metadata envelope: `{ok, uri, etag, last_modified}`.
    ///
    /// The written version's etag and timestamp travel in the headers as
    /// well as the body, so callers can chain conditional writes without
    /// parsing. Caching is disabled; a 201 carries a `Location` header.
    pub fn json_meta(
        status: u16,
        uri: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Response {
        let body = json!({
            "ok": true,
            "uri": uri,
            "etag": etag,
            "last_modified": last_modified,
        });
        let mut response = Response::json(status, body.to_string(), etag, last_modified);
        response
            .headers
            .insert("Cache-Control".to_string(), "no-cache".to_string());
        if status == 201 {
            response
                .headers
                .insert("Location".to_string(), uri.to_string());
        }
        response
    }

    /// Builds an `Allow` response for OPTIONS.
    pub fn allow(methods: &[&str]) -> Response {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Allow".to_string(), methods.join(", "));
        Response { status: 200, headers, body: String::new() }
    }

    fn error(status: u16, message: &str) -> Response {
        let body = json!({ "error": message }).to_string();
        let mut response = Response::json(status, body, None, None);
        response
            .headers
            .insert("Cache-Control".to_string(), "no-cache".to_string());
        response
    }

    /// 400 — the URI names no registered collection or view.
    pub fn invalid_entity_type() -> Response {
        Response::error(400, "valid entity type required")
    }

    /// 400 — an update or delete arrived without the required etag.
    pub fn etag_required() -> Response {
        Response::error(400, "etag required")
    }

    /// 404 — absent, or present but owned by a different principal.
    pub fn not_found() -> Response {
        Response::error(404, "not found")
    }

    /// 405 — the URI kind does not allow this verb.
    pub fn method_not_allowed(methods: &[&str]) -> Response {
        let mut response = Response::error(405, "method not allowed");
        response
            .headers
            .insert("Allow".to_string(), methods.join(", "));
        response
    }

    /// 410 — the canonical URI addresses a tombstoned resource.
    pub fn gone() -> Response {
        Response::error(410, "entity previously deleted")
    }

    /// 412 — the supplied etag does not match the current version.
    pub fn precondition_failed() -> Response {
        Response::error(412, "precondition failed")
    }

    /// 422 — the payload is not valid JSON.
    pub fn unprocessable() -> Response {
        Response::error(422, "unprocessable entity")
    }

    /// 500 — adapter-level failure.
    pub fn internal_server_error() -> Response {
        Response::error(500, "unknown server error")
    }

    /// 501 — verb entirely unsupported by the store.
    pub fn not_implemented() -> Response {
        Response::error(501, "not implemented")
    }

    /// Returns a copy with the body stripped, suitable for HEAD.
    pub fn head(&self) -> Response {
        Response {
            status: self.status,
            headers: self.headers.clone(),
            body: String::new(),
        }
    }

    /// Returns the header value for `key`, if set.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Returns the `ETag` header without its surrounding quotes.
    pub fn etag(&self) -> Option<&str> {
        self.header("ETag")
            .map(|etag| etag.trim_matches('"'))
    }

    /// Parses and returns the JSON body.
    pub fn parsed_content(&self) -> StoreResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_responses_quote_etags() {
        let response = Response::json(200, "{}", Some("abc"), Some("Mon, 01 Jan 2024 00:00:00 GMT"));
        assert_eq!(response.header("ETag"), Some("\"abc\""));
        assert_eq!(response.etag(), Some("abc"));
        assert_eq!(response.header("Cache-Control"), Some("proxy-revalidate"));
        assert_eq!(response.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn meta_envelope_disables_caching() {
        let response = Response::json_meta(200, "/items/1", Some("abc"), Some("ts"));
        assert_eq!(response.header("Cache-Control"), Some("no-cache"));
        let parsed = response.parsed_content().unwrap();
        assert_eq!(parsed["ok"], true);
        assert_eq!(parsed["uri"], "/items/1");
        assert_eq!(parsed["etag"], "abc");
    }

    #[test]
    fn meta_envelope_carries_the_version_headers() {
        let response =
            Response::json_meta(200, "/items/1", Some("abc"), Some("Mon, 01 Jan 2024 00:00:00 GMT"));
        assert_eq!(response.etag(), Some("abc"));
        assert_eq!(
            response.header("Last-Modified"),
            Some("Mon, 01 Jan 2024 00:00:00 GMT")
        );
    }

    #[test]
    fn created_responses_carry_a_location() {
        let response = Response::json_meta(201, "/items/1", Some("abc"), Some("ts"));
        assert_eq!(response.header("Location"), Some("/items/1"));
    }

    #[test]
    fn error_bodies_use_the_error_envelope() {
        let response = Response::gone();
        assert_eq!(response.status, 410);
        assert_eq!(
            response.parsed_content().unwrap()["error"],
            "entity previously deleted"
        );
    }

    #[test]
    fn method_not_allowed_lists_the_alternatives() {
        let response = Response::method_not_allowed(&["GET", "HEAD", "OPTIONS"]);
        assert_eq!(response.header("Allow"), Some("GET, HEAD, OPTIONS"));
    }

    #[test]
    fn head_strips_the_body_and_keeps_headers() {
        let response = Response::json(200, "{\"a\":1}", Some("abc"), None).head();
        assert!(response.body.is_empty());
        assert_eq!(response.etag(), Some("abc"));
    }
}
