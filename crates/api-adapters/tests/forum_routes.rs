//! Router-level tests over the in-memory store.

use std::sync::Arc;

use api_adapters::{router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use services::Services;
use storage_adapters::MemoryStore;
use tower::ServiceExt;

fn app() -> Router {
    let services = Services::new(Arc::new(MemoryStore::new()));
    router(AppState::new(services))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn seed(app: &Router) {
    let (status, _) = call(
        app,
        Method::POST,
        "/user/alice/create",
        Some(json!({"fullname": "Alice", "about": "", "email": "alice@example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        app,
        Method::POST,
        "/forum/create",
        Some(json!({"slug": "rust", "title": "Rust", "user": "ALICE"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        app,
        Method::POST,
        "/forum/rust/create",
        Some(json!({"title": "Ownership", "author": "alice", "message": "?", "slug": "ownership"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_user_returns_conflicting_users() {
    let app = app();
    seed(&app).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/user/Alice/create",
        Some(json!({"fullname": "Other", "email": "other@example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body[0]["nickname"], "alice");
}

#[tokio::test]
async fn posts_are_created_and_listed_as_tree() {
    let app = app();
    seed(&app).await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/thread/ownership/create",
        Some(json!([{"parent": 0, "author": "alice", "message": "root"}])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let root = created[0]["id"].as_i64().unwrap();
    assert!(created[0].get("path").is_none());

    let (status, _) = call(
        &app,
        Method::POST,
        "/thread/1/create",
        Some(json!([{"parent": root, "author": "alice", "message": "reply"}])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, listed) = call(&app, Method::GET, "/thread/ownership/posts?sort=tree&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    let messages: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["root", "reply"]);
}

#[tokio::test]
async fn error_statuses_follow_the_domain() {
    let app = app();
    seed(&app).await;

    let (status, body) = call(&app, Method::GET, "/thread/nope/details", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());

    let (status, _) = call(&app, Method::GET, "/thread/1/posts?sort=random", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/thread/1/create",
        Some(json!([{"parent": 77, "author": "alice", "message": "orphan"}])),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/thread/1/create",
        Some(json!([{"author": "ghost", "message": "boo"}])),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::GET, "/post/abc/details", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn votes_and_service_status() {
    let app = app();
    seed(&app).await;

    let (_, thread) = call(
        &app,
        Method::POST,
        "/thread/ownership/vote",
        Some(json!({"nickname": "alice", "voice": 1})),
    )
    .await;
    assert_eq!(thread["votes"], 1);
    let (_, thread) = call(
        &app,
        Method::POST,
        "/thread/1/vote",
        Some(json!({"nickname": "ALICE", "voice": -1})),
    )
    .await;
    assert_eq!(thread["votes"], -1);

    let (status, counts) = call(&app, Method::GET, "/service/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(counts, json!({"user": 1, "forum": 1, "thread": 1, "post": 0}));

    let (status, _) = call(&app, Method::POST, "/service/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, counts) = call(&app, Method::GET, "/service/status", None).await;
    assert_eq!(counts["user"], 0);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = app();

    let generated = app
        .clone()
        .oneshot(Request::get("/service/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = generated.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(id.len(), 36);

    let echoed = app
        .oneshot(
            Request::get("/service/status")
                .header("x-request-id", "trace-me-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(echoed.headers()["x-request-id"], "trace-me-42");
}
