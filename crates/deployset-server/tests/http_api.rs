//! End-to-end exercises of the HTTP surface against the in-memory
//! repository.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use deployset_server::memory::MemoryRepository;
use deployset_server::{router, AppState};

const ZERO_ID: &str = "0000000000000000000000000000000000000000";
const MODULE01_ID: &str = "4efb2d1ae4f101a1ef4e0a08705910191868c5cc";
const BOTH_MODULES_ID: &str = "e1baae2d638987e1ae70ab1a1cec6d4905f780c9";

fn app() -> Router {
    router(AppState {
        repo: Arc::new(MemoryRepository::new()),
    })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_raw(app: &Router, method: Method, uri: &str, body: &str) -> StatusCode {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap().status()
}

fn parse(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn add_module01() -> Value {
    json!({"modules": {"add": {"test-module01": {"version": "TEST_VERSION01"}}}})
}

#[test]
fn zero_id_is_forty_zeros() {
    assert_eq!(ZERO_ID.len(), 40);
    assert!(ZERO_ID.bytes().all(|b| b == b'0'));
}

#[tokio::test]
async fn listing_an_unknown_scope_yields_an_empty_array() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/orgs/o/apps/a/sets", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");

    let (status, body) = send(&app, Method::GET, "/orgs/o/apps/a/deltas", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn the_zero_sentinel_is_the_empty_set() {
    let app = app();
    let uri = format!("/orgs/o/apps/a/sets/{ZERO_ID}");
    let (status, body) = send(&app, Method::GET, &uri, None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"modules": {}, "version": 0}));

    // Any all-zeros id is the sentinel, whatever its length.
    let (status, _) = send(&app, Method::GET, "/sets/000", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn applying_a_delta_stores_the_set_under_its_content_id() {
    let app = app();
    let apply_uri = format!("/orgs/o/apps/a/sets/{ZERO_ID}");

    let (status, body) = send(&app, Method::POST, &apply_uri, Some(add_module01()), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!(MODULE01_ID));

    // The stored content is retrievable scoped and unscoped.
    let expected = json!({"modules": {"test-module01": {"version": "TEST_VERSION01"}}, "version": 0});
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/orgs/o/apps/a/sets/{MODULE01_ID}"),
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), expected);

    let (status, body) = send(&app, Method::GET, &format!("/sets/{MODULE01_ID}"), None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), expected);

    // Re-applying the same delta lands on the same id; the duplicate
    // insert is a semantic success.
    let (status, body) = send(&app, Method::POST, &apply_uri, Some(add_module01()), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!(MODULE01_ID));

    // Building on the stored set yields the combined set's id.
    let second = json!({"modules": {"add": {"test-module02": {"version": "TEST_VERSION02"}}}});
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/orgs/o/apps/a/sets/{MODULE01_ID}"),
        Some(second),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!(BOTH_MODULES_ID));

    let (status, body) = send(&app, Method::GET, "/orgs/o/apps/a/sets", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body).as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn an_empty_delta_echoes_the_base_id_without_writing() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/orgs/o/apps/a/sets/{ZERO_ID}"),
        Some(json!({})),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!(ZERO_ID));

    // A short sentinel still echoes the canonical zero id.
    let (status, body) = send(
        &app,
        Method::POST,
        "/orgs/o/apps/a/sets/00",
        Some(json!({})),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!(ZERO_ID));

    // Nothing was stored by the echoes.
    let (_, body) = send(&app, Method::GET, "/orgs/o/apps/a/sets", None, &[]).await;
    assert_eq!(body, b"[]");

    // Against a stored set, the set's own id comes back.
    send(
        &app,
        Method::POST,
        &format!("/orgs/o/apps/a/sets/{ZERO_ID}"),
        Some(add_module01()),
        &[],
    )
    .await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/orgs/o/apps/a/sets/{MODULE01_ID}"),
        Some(json!({})),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!(MODULE01_ID));
}

#[tokio::test]
async fn applying_to_an_unknown_base_is_not_found() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/orgs/o/apps/a/sets/deadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
        Some(add_module01()),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::GET,
        "/orgs/o/apps/a/sets/deadbeefdeadbeefdeadbeefdeadbeefdeadbeef",
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/sets/deadbeef", None, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn a_malformed_body_is_unprocessable() {
    let app = app();
    let uri = format!("/orgs/o/apps/a/sets/{ZERO_ID}");
    assert_eq!(
        send_raw(&app, Method::POST, &uri, "not json at all").await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        send_raw(&app, Method::POST, "/orgs/o/apps/a/deltas", "{").await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn an_incompatible_delta_is_a_bad_request() {
    let app = app();
    let delta = json!({"modules": {"update": {"test-module": [
        {"op": "add", "path": "/k", "value": 1}
    ]}}});
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/orgs/o/apps/a/sets/{ZERO_ID}"),
        Some(delta),
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!("Delta is not compatible with Set"));
}

#[tokio::test]
async fn diffing_two_stored_sets_returns_the_delta() {
    let app = app();
    send(
        &app,
        Method::POST,
        &format!("/orgs/o/apps/a/sets/{ZERO_ID}"),
        Some(add_module01()),
        &[],
    )
    .await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/orgs/o/apps/a/sets/{MODULE01_ID}?diff={ZERO_ID}"),
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let delta = parse(&body);
    assert_eq!(
        delta["modules"]["add"],
        json!({"test-module01": {"version": "TEST_VERSION01"}})
    );
    assert_eq!(delta["modules"]["remove"], json!([]));
    assert_eq!(delta["modules"]["update"], json!({}));

    // The reverse diff removes the module.
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/orgs/o/apps/a/sets/{ZERO_ID}?diff={MODULE01_ID}"),
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["modules"]["remove"], json!(["test-module01"]));

    // An unknown side is a 404.
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/orgs/o/apps/a/sets/{MODULE01_ID}?diff=ffffffffffffffffffffffffffffffffffffffff"),
        None,
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delta_lifecycle_create_get_replace() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/orgs/o/apps/a/deltas",
        Some(json!({"modules": {"add": {"m": {"p": "v1"}}}})),
        &[("from", "alice")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id: String = serde_json::from_slice(&body).unwrap();
    assert_eq!(id.len(), 40);

    let uri = format!("/orgs/o/apps/a/deltas/{id}");
    let (status, body) = send(&app, Method::GET, &uri, None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    let envelope = parse(&body);
    assert_eq!(envelope["id"], json!(id));
    assert_eq!(envelope["metadata"]["createdBy"], json!("alice"));
    assert_eq!(envelope["metadata"].get("contributors"), None);
    assert_eq!(
        envelope["content"]["modules"]["add"],
        json!({"m": {"p": "v1"}})
    );

    // Listing includes the stored delta.
    let (_, body) = send(&app, Method::GET, "/orgs/o/apps/a/deltas", None, &[]).await;
    assert_eq!(parse(&body).as_array().unwrap().len(), 1);

    // A full replacement by another editor records them as contributor.
    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({"modules": {"remove": ["m"]}})),
        &[("from", "bob")],
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, &uri, None, &[]).await;
    let envelope = parse(&body);
    assert_eq!(envelope["metadata"]["createdBy"], json!("alice"));
    assert_eq!(envelope["metadata"]["contributors"], json!(["bob"]));
    assert_eq!(envelope["content"]["modules"]["remove"], json!(["m"]));
}

#[tokio::test]
async fn patching_a_delta_folds_updates_into_it() {
    let app = app();

    let (_, body) = send(
        &app,
        Method::POST,
        "/orgs/o/apps/a/deltas",
        Some(json!({"modules": {"add": {"m": {"p": "v1"}}}})),
        &[("from", "alice")],
    )
    .await;
    let id: String = serde_json::from_slice(&body).unwrap();
    let uri = format!("/orgs/o/apps/a/deltas/{id}");

    let patch = json!([{"modules": {"update": {"m": [
        {"op": "add", "path": "/q", "value": "v2"},
        {"op": "replace", "path": "/p", "value": "V1"}
    ]}}}]);
    let (status, body) = send(&app, Method::PATCH, &uri, Some(patch), &[("from", "bob")]).await;
    assert_eq!(status, StatusCode::OK);
    let envelope = parse(&body);
    assert_eq!(
        envelope["content"]["modules"]["add"],
        json!({"m": {"p": "V1", "q": "v2"}})
    );
    assert_eq!(envelope["metadata"]["contributors"], json!(["bob"]));

    // An empty batch returns the stored envelope unchanged.
    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!([])), &[]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        parse(&body)["content"]["modules"]["add"],
        json!({"m": {"p": "V1", "q": "v2"}})
    );

    // A fold that cannot apply is a 400.
    let bad = json!([{"modules": {"update": {"m": [
        {"op": "replace", "path": "/missing", "value": 1}
    ]}}}]);
    let (status, _) = send(&app, Method::PATCH, &uri, Some(bad), &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_delta_ids_are_not_found() {
    let app = app();
    let uri = "/orgs/o/apps/a/deltas/0123456789abcdef0123456789abcdef01234567";
    let (status, _) = send(&app, Method::GET, uri, None, &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, uri, Some(json!({})), &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PATCH, uri, Some(json!([])), &[]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn identity_comes_from_the_jwt_claim_when_present() {
    let app = app();
    // {"alg":"none"} . {"username":"carol"} . <unchecked signature>
    let token = "eyJhbGciOiJub25lIn0.eyJ1c2VybmFtZSI6ImNhcm9sIn0.unchecked";
    let (_, body) = send(
        &app,
        Method::POST,
        "/orgs/o/apps/a/deltas",
        Some(json!({})),
        &[("authorization", &format!("JWT {token}"))],
    )
    .await;
    let id: String = serde_json::from_slice(&body).unwrap();

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/orgs/o/apps/a/deltas/{id}"),
        None,
        &[],
    )
    .await;
    assert_eq!(parse(&body)["metadata"]["createdBy"], json!("carol"));
}

#[tokio::test]
async fn anonymous_edits_are_attributed_to_unknown() {
    let app = app();
    let (_, body) = send(
        &app,
        Method::POST,
        "/orgs/o/apps/a/deltas",
        Some(json!({})),
        &[],
    )
    .await;
    let id: String = serde_json::from_slice(&body).unwrap();

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/orgs/o/apps/a/deltas/{id}"),
        None,
        &[],
    )
    .await;
    assert_eq!(parse(&body)["metadata"]["createdBy"], json!("UNKNOWN"));
}

#[tokio::test]
async fn probes_answer_ok() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/alive", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/ready", None, &[]).await;
    assert_eq!(status, StatusCode::OK);
}
