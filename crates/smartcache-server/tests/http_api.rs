//! End-to-end tests for the HTTP surface

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use smartcache_runtime::{Runtime, RuntimeBuilder};
use smartcache_server::security::{ApiKeyAuth, API_KEY_HEADER};
use smartcache_server::{api, AppState, BreachService};
use smartcache_storage::{FileStore, MemoryStore, StateStore};
use std::sync::Arc;
use tower::ServiceExt;

const KEY: &str = "test-key";

fn runtime_over(store: Arc<dyn StateStore>) -> Arc<Runtime> {
    Arc::new(RuntimeBuilder::new().with_store(store).build().unwrap())
}

fn app(runtime: Arc<Runtime>, api_key: Option<&str>) -> Router {
    let state = AppState::new(BreachService::new(runtime));
    api::router(state, ApiKeyAuth::new(api_key.map(str::to_string)))
}

fn memory_app() -> Router {
    app(runtime_over(Arc::new(MemoryStore::new())), Some(KEY))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(API_KEY_HEADER, KEY);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_missing_key_is_unauthorized() {
    let app = memory_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/checkemail/a@b.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_key_is_forbidden() {
    let app = memory_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/checkemail/a@b.com")
                .header(API_KEY_HEADER, "nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_is_public() {
    let app = memory_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_auth_disabled_without_configured_key() {
    let app = app(runtime_over(Arc::new(MemoryStore::new())), None);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/checkemail/a@b.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_email_lifecycle() {
    let app = memory_app();

    let (status, body) = send(&app, Method::GET, "/checkemail/x@y.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["breached"], false);

    let (status, body) = send(&app, Method::POST, "/addemail?email=x@y.com", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["breached"], true);

    let (status, body) = send(&app, Method::POST, "/addemail?email=x@y.com", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, _) = send(&app, Method::GET, "/checkemail/x@y.com", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/deleteemail?email=x@y.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["breached"], false);

    let (status, _) = send(&app, Method::GET, "/checkemail/x@y.com", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_rejects_malformed_email() {
    let app = memory_app();

    let (status, body) = send(&app, Method::POST, "/addemail?email=not-an-email", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (status, _) = send(&app, Method::GET, "/checkemail/not-an-email", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_batch_empty_is_bad_request() {
    let app = memory_app();
    let (status, _) = send(&app, Method::POST, "/addemails", Some(serde_json::json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_partitions_input() {
    let app = memory_app();

    let (status, _) = send(&app, Method::POST, "/addemail?email=old@y.com", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let body = serde_json::json!(["new@y.com", "old@y.com", "broken", "new@y.com"]);
    let (status, result) = send(&app, Method::POST, "/addemails", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["added"], serde_json::json!(["new@y.com"]));
    assert_eq!(result["alreadyBreached"], serde_json::json!(["old@y.com"]));
    assert_eq!(result["invalid"], serde_json::json!(["broken"]));
    assert_eq!(result["failed"], serde_json::json!([]));

    let (status, _) = send(&app, Method::GET, "/checkemail/new@y.com", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = runtime_over(Arc::new(FileStore::open(dir.path()).await.unwrap()));
    let app1 = app(first.clone(), Some(KEY));
    let (status, _) = send(&app1, Method::POST, "/addemail?email=keep@y.com", None).await;
    assert_eq!(status, StatusCode::CREATED);
    first.stop().await.unwrap();

    let second = runtime_over(Arc::new(FileStore::open(dir.path()).await.unwrap()));
    let app2 = app(second, Some(KEY));
    let (status, body) = send(&app2, Method::GET, "/checkemail/keep@y.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["breached"], true);
}
