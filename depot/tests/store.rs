//! End-to-end store behavior over the in-memory backend.

use depot::memory::MemoryTable;
use depot::prelude::*;
use serde_json::{Value, json};

async fn store() -> Store<MemoryTable> {
    let view = ExtractionView::new("item_colors", "items", ["color"]);
    Store::open(MemoryTable::new(), ["items", "notes"], vec![view])
        .await
        .unwrap()
}

fn write(json: &Value) -> WriteOptions {
    WriteOptions::new(json.to_string())
}

fn list() -> ListOptions {
    ListOptions::new()
}

#[tokio::test]
async fn put_creates_at_the_callers_uri() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"color": "green"})))
        .await
        .unwrap();
    assert_eq!(created.status, 201);
    assert_eq!(created.header("Location"), Some("/items/123"));
    let meta = created.parsed_content().unwrap();
    assert_eq!(meta["ok"], true);
    assert_eq!(meta["uri"], "/items/123");
    assert!(meta["etag"].is_string());
    assert!(meta["last_modified"].is_string());

    let fetched = store.get("/items/123", &list()).await.unwrap();
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.parsed_content().unwrap()["color"], "green");
    assert_eq!(fetched.etag(), created.etag());
    assert!(fetched.header("Last-Modified").is_some());
}

#[tokio::test]
async fn post_generates_the_id() {
    let store = store().await;
    let created = store
        .post("/items", &write(&json!({"color": "red"})))
        .await
        .unwrap();
    assert_eq!(created.status, 201);

    let uri = created.parsed_content().unwrap()["uri"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(uri.starts_with("/items/"));
    assert_eq!(created.header("Location"), Some(uri.as_str()));

    let listing = store.get("/items", &list()).await.unwrap();
    let body = listing.parsed_content().unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["uris"][0], uri.as_str());
}

#[tokio::test]
async fn repeated_reads_are_stable() {
    let store = store().await;
    store
        .put("/items/123", &write(&json!({"color": "green"})))
        .await
        .unwrap();

    let first = store.get("/items/123", &list()).await.unwrap();
    let second = store.get("/items/123", &list()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn updates_archive_the_replaced_version() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();
    let first_etag = created.etag().unwrap().to_string();

    let updated = store
        .put("/items/123", &write(&json!({"rev": 2})).etag(&first_etag))
        .await
        .unwrap();
    assert_eq!(updated.status, 200);
    assert_ne!(updated.etag(), Some(first_etag.as_str()));

    // The canonical URI serves the replacement.
    let current = store.get("/items/123", &list()).await.unwrap();
    assert_eq!(current.parsed_content().unwrap()["rev"], 2);
    assert_eq!(current.etag(), updated.etag());

    // The replaced version stays addressable under its etag.
    let archived_uri = format!("/items/123/versions/{first_etag}");
    let archived = store.get(&archived_uri, &list()).await.unwrap();
    assert_eq!(archived.status, 200);
    assert_eq!(archived.parsed_content().unwrap()["rev"], 1);
    assert_eq!(archived.etag(), Some(first_etag.as_str()));
}

#[tokio::test]
async fn version_listings_run_newest_first() {
    let store = store().await;
    let mut etag = store
        .put("/items/123", &write(&json!({"rev": 0})))
        .await
        .unwrap()
        .etag()
        .unwrap()
        .to_string();
    let mut archived = Vec::new();
    for rev in 1..=3 {
        archived.push(format!("/items/123/versions/{etag}"));
        etag = store
            .put("/items/123", &write(&json!({"rev": rev})).etag(&etag))
            .await
            .unwrap()
            .etag()
            .unwrap()
            .to_string();
    }

    let listing = store.get("/items/123/versions", &list()).await.unwrap();
    let body = listing.parsed_content().unwrap();
    assert_eq!(body["total"], 4);
    // Newest first: the canonical URI, then archives youngest to oldest.
    assert_eq!(body["uris"][0], "/items/123");
    assert_eq!(body["uris"][1], archived[2].as_str());
    assert_eq!(body["uris"][3], archived[0].as_str());
}

#[tokio::test]
async fn version_listings_need_an_existing_resource() {
    let store = store().await;
    let missing = store.get("/items/123/versions", &list()).await.unwrap();
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn updates_without_an_etag_are_rejected() {
    let store = store().await;
    store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();

    let rejected = store
        .put("/items/123", &write(&json!({"rev": 2})))
        .await
        .unwrap();
    assert_eq!(rejected.status, 400);
    assert_eq!(rejected.parsed_content().unwrap()["error"], "etag required");
}

#[tokio::test]
async fn stale_etags_fail_the_precondition() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();
    let etag = created.etag().unwrap().to_string();

    // Two writers hold the same observation; only one may win.
    let first = store
        .put("/items/123", &write(&json!({"rev": 2})).etag(&etag))
        .await
        .unwrap();
    let second = store
        .put("/items/123", &write(&json!({"rev": 3})).etag(&etag))
        .await
        .unwrap();
    assert_eq!(first.status, 200);
    assert_eq!(second.status, 412);

    let current = store.get("/items/123", &list()).await.unwrap();
    assert_eq!(current.parsed_content().unwrap()["rev"], 2);
}

#[tokio::test]
async fn malformed_payloads_are_unprocessable() {
    let store = store().await;
    let rejected = store
        .put("/items/123", &WriteOptions::new("not json"))
        .await
        .unwrap();
    assert_eq!(rejected.status, 422);

    let created = store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();
    let rejected = store
        .put(
            "/items/123",
            &WriteOptions::new("{broken").etag(created.etag().unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, 422);
}

#[tokio::test]
async fn foreign_resources_read_as_absent() {
    let store = store().await;
    let created = store
        .put(
            "/items/123",
            &write(&json!({"rev": 1})).remote_user("coltrane"),
        )
        .await
        .unwrap();
    let etag = created.etag().unwrap().to_string();

    let probe = store
        .get("/items/123", &list().remote_user("monk"))
        .await
        .unwrap();
    assert_eq!(probe.status, 404);

    // A write by the wrong principal answers 404 even with the right
    // etag, before the etag is examined at all.
    let update = store
        .put(
            "/items/123",
            &write(&json!({"rev": 2})).remote_user("monk"),
        )
        .await
        .unwrap();
    assert_eq!(update.status, 404);

    let delete = store
        .delete(
            "/items/123",
            &DeleteOptions::new().remote_user("monk").etag(&etag),
        )
        .await
        .unwrap();
    assert_eq!(delete.status, 404);

    // The owner still sees it.
    let owner = store
        .get("/items/123", &list().remote_user("coltrane"))
        .await
        .unwrap();
    assert_eq!(owner.status, 200);
}

#[tokio::test]
async fn listings_scope_to_the_remote_user() {
    let store = store().await;
    store
        .put("/items/a", &write(&json!({"n": 1})).remote_user("coltrane"))
        .await
        .unwrap();
    store
        .put("/items/b", &write(&json!({"n": 2})).remote_user("monk"))
        .await
        .unwrap();

    let scoped = store
        .get("/items", &list().remote_user("coltrane"))
        .await
        .unwrap();
    let body = scoped.parsed_content().unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["uris"][0], "/items/a");
}

#[tokio::test]
async fn deletes_tombstone_and_archive() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();
    let etag = created.etag().unwrap().to_string();

    let no_etag = store.delete("/items/123", &DeleteOptions::new()).await.unwrap();
    assert_eq!(no_etag.status, 400);

    let stale = store
        .delete("/items/123", &DeleteOptions::new().etag("bogus"))
        .await
        .unwrap();
    assert_eq!(stale.status, 412);

    let deleted = store
        .delete("/items/123", &DeleteOptions::new().etag(&etag))
        .await
        .unwrap();
    assert_eq!(deleted.status, 200);
    let meta = deleted.parsed_content().unwrap();
    assert_eq!(
        meta["uri"],
        format!("/items/123/versions/{etag}").as_str()
    );
    assert_eq!(meta["etag"], etag.as_str());

    // The canonical URI now answers gone, and stays gone.
    let gone = store.get("/items/123", &list()).await.unwrap();
    assert_eq!(gone.status, 410);
    let again = store
        .delete("/items/123", &DeleteOptions::new().etag(&etag))
        .await
        .unwrap();
    assert_eq!(again.status, 410);

    // It vanishes from the collection listing.
    let listing = store.get("/items", &list()).await.unwrap();
    assert_eq!(listing.parsed_content().unwrap()["total"], 0);

    // The archived version remains addressable.
    let archived = store
        .get(&format!("/items/123/versions/{etag}"), &list())
        .await
        .unwrap();
    assert_eq!(archived.status, 200);
}

#[tokio::test]
async fn version_listings_exclude_the_tombstone() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();
    let etag = store
        .put(
            "/items/123",
            &write(&json!({"rev": 2})).etag(created.etag().unwrap()),
        )
        .await
        .unwrap()
        .etag()
        .unwrap()
        .to_string();
    store
        .delete("/items/123", &DeleteOptions::new().etag(&etag))
        .await
        .unwrap();

    // Two archived versions; the tombstone itself is not a version.
    let listing = store.get("/items/123/versions", &list()).await.unwrap();
    assert_eq!(listing.parsed_content().unwrap()["total"], 2);
}

#[tokio::test]
async fn put_recreates_over_a_tombstone() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();
    store
        .delete(
            "/items/123",
            &DeleteOptions::new().etag(created.etag().unwrap()),
        )
        .await
        .unwrap();

    // No etag needed: the tombstone counts as absence for PUT.
    let recreated = store
        .put("/items/123", &write(&json!({"rev": 2})))
        .await
        .unwrap();
    assert_eq!(recreated.status, 201);

    let fetched = store.get("/items/123", &list()).await.unwrap();
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.parsed_content().unwrap()["rev"], 2);

    let listing = store.get("/items", &list()).await.unwrap();
    assert_eq!(listing.parsed_content().unwrap()["total"], 1);
}

#[tokio::test]
async fn meta_lists_collections_and_views() {
    let store = store().await;
    let meta = store.get(META_URI, &list()).await.unwrap();
    assert_eq!(meta.status, 200);
    let body = meta.parsed_content().unwrap();
    let uris: Vec<&str> = body["uris"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap())
        .collect();
    assert_eq!(uris, vec!["/items", "/notes", "/item_colors"]);

    let head = store.head(META_URI, &list()).await.unwrap();
    assert_eq!(head.status, 200);
    assert!(head.body.is_empty());
    assert_eq!(head.etag(), meta.etag());
}

#[tokio::test]
async fn unknown_entity_types_are_bad_requests() {
    let store = store().await;
    assert_eq!(store.get("/nothing", &list()).await.unwrap().status, 400);
    assert_eq!(
        store
            .put("/nothing/1", &write(&json!({})))
            .await
            .unwrap()
            .status,
        400
    );
    assert_eq!(
        store
            .delete("/nothing/1", &DeleteOptions::new())
            .await
            .unwrap()
            .status,
        400
    );
}

#[tokio::test]
async fn unroutable_shapes_under_known_names_are_not_found() {
    let store = store().await;
    assert_eq!(
        store.get("/items/1/history", &list()).await.unwrap().status,
        404
    );
    assert_eq!(
        store.get("/item_colors/1", &list()).await.unwrap().status,
        404
    );
}

#[tokio::test]
async fn wrong_verbs_answer_method_not_allowed() {
    let store = store().await;
    store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();

    let post = store
        .post("/items/123", &write(&json!({})))
        .await
        .unwrap();
    assert_eq!(post.status, 405);
    assert_eq!(post.header("Allow"), Some("GET, HEAD, PUT, DELETE, OPTIONS"));

    let put = store.put("/items", &write(&json!({}))).await.unwrap();
    assert_eq!(put.status, 405);
    assert_eq!(put.header("Allow"), Some("GET, HEAD, POST, OPTIONS"));

    let delete = store.delete("/items", &DeleteOptions::new()).await.unwrap();
    assert_eq!(delete.status, 405);

    let version = store
        .put("/items/123/versions/abc", &write(&json!({})))
        .await
        .unwrap();
    assert_eq!(version.status, 405);
}

#[tokio::test]
async fn options_reports_the_method_table() {
    let store = store().await;
    let options = store.options("/items/123").await.unwrap();
    assert_eq!(options.status, 200);
    assert_eq!(options.header("Allow"), Some("GET, HEAD, PUT, DELETE, OPTIONS"));

    assert_eq!(store.options("/nothing").await.unwrap().status, 400);
    assert_eq!(store.options("/items/1/history").await.unwrap().status, 404);

    assert_eq!(
        store.methods_for_uri("/items"),
        Some(&["GET", "HEAD", "POST", "OPTIONS"][..])
    );
    assert!(store.implements("get"));
    assert!(store.implements("DELETE"));
    assert!(!store.implements("TRACE"));
}

#[tokio::test]
async fn head_carries_metadata_without_a_body() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();

    let head = store.head("/items/123", &list()).await.unwrap();
    assert_eq!(head.status, 200);
    assert!(head.body.is_empty());
    assert_eq!(head.etag(), created.etag());
    assert!(head.header("Last-Modified").is_some());

    assert_eq!(store.head("/items/999", &list()).await.unwrap().status, 404);

    store
        .delete(
            "/items/123",
            &DeleteOptions::new().etag(created.etag().unwrap()),
        )
        .await
        .unwrap();
    let gone = store.head("/items/123", &list()).await.unwrap();
    assert_eq!(gone.status, 410);
    assert!(gone.body.is_empty());
}

#[tokio::test]
async fn views_track_the_current_version() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"color": "green"})))
        .await
        .unwrap();

    let green = store
        .get("/item_colors", &list().filter("color", "green"))
        .await
        .unwrap();
    let body = green.parsed_content().unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["uris"][0], "/items/123");

    // An update rewrites the projection; the old value no longer matches.
    store
        .put(
            "/items/123",
            &write(&json!({"color": "blue"})).etag(created.etag().unwrap()),
        )
        .await
        .unwrap();
    let stale = store
        .get("/item_colors", &list().filter("color", "green"))
        .await
        .unwrap();
    assert_eq!(stale.parsed_content().unwrap()["total"], 0);
    let fresh = store
        .get("/item_colors", &list().filter("color", "blue"))
        .await
        .unwrap();
    assert_eq!(fresh.parsed_content().unwrap()["total"], 1);
}

#[tokio::test]
async fn views_drop_deleted_resources() {
    let store = store().await;
    let created = store
        .put("/items/123", &write(&json!({"color": "green"})))
        .await
        .unwrap();
    store
        .delete(
            "/items/123",
            &DeleteOptions::new().etag(created.etag().unwrap()),
        )
        .await
        .unwrap();

    let listing = store.get("/item_colors", &list()).await.unwrap();
    assert_eq!(listing.parsed_content().unwrap()["total"], 0);
}

#[tokio::test]
async fn views_ignore_unobserved_collections() {
    let store = store().await;
    store
        .put("/notes/1", &write(&json!({"color": "green"})))
        .await
        .unwrap();

    let listing = store.get("/item_colors", &list()).await.unwrap();
    assert_eq!(listing.parsed_content().unwrap()["total"], 0);
}

#[tokio::test]
async fn listings_paginate() {
    let store = store().await;
    for i in 0..5 {
        store
            .put(&format!("/items/{i}"), &write(&json!({"n": i})))
            .await
            .unwrap();
    }

    let page = store
        .get("/items", &list().offset(1).limit(2))
        .await
        .unwrap();
    let body = page.parsed_content().unwrap();
    assert_eq!(body["total"], 5);
    assert_eq!(body["offset"], 1);
    // Newest first.
    assert_eq!(body["uris"][0], "/items/3");
    assert_eq!(body["uris"][1], "/items/2");

    let tail = store.get("/items", &list().offset(4)).await.unwrap();
    assert_eq!(tail.parsed_content().unwrap()["uris"][0], "/items/0");
}

#[tokio::test]
async fn reset_empties_the_store() {
    let store = store().await;
    store
        .put("/items/123", &write(&json!({"rev": 1})))
        .await
        .unwrap();
    store.reset().await.unwrap();

    assert_eq!(store.get("/items/123", &list()).await.unwrap().status, 404);
    let listing = store.get("/items", &list()).await.unwrap();
    assert_eq!(listing.parsed_content().unwrap()["total"], 0);
}
