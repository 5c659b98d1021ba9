//! HTTP API integration tests
//!
//! These drive the assembled router with `tower::ServiceExt::oneshot` against
//! in-memory storage.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tinylink::models::Link;
use tinylink::storage::{MemoryStorage, Storage, StorageError, StorageResult};
use tinylink::{create_app, LinkRegistry};
use tower::ServiceExt;

const BASE_URL: &str = "http://sho.rt";

/// Helper to create a router over fresh in-memory storage
fn create_test_app() -> Router {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    create_app(Arc::new(LinkRegistry::new(storage)), BASE_URL.to_string())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let content_type = body.map(|_| "application/json");
    send_with_content_type(app, method, uri, content_type, body).await
}

async fn send_with_content_type(
    app: &Router,
    method: &str,
    uri: &str,
    content_type: Option<&str>,
    body: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = send(&app, "GET", "/healthz", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_create_with_generated_code() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/links",
        Some(r#"{"url": "https://example.com/a"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let code = body["code"].as_str().unwrap();
    assert!(tinylink::validate::is_valid_code(code));
    assert_eq!(body["url"], "https://example.com/a");
    assert_eq!(body["clicks"], 0);
    assert_eq!(body["shortUrl"], format!("{BASE_URL}/{code}"));
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_with_custom_code() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/links",
        Some(r#"{"url": "https://example.com", "code": "Custom1"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], "Custom1");
    assert_eq!(body["shortUrl"], "http://sho.rt/Custom1");
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let app = create_test_app();

    for payload in [
        r#"{"url": "javascript:alert(1)"}"#,
        r#"{"url": "ftp://x.com"}"#,
        r#"{"url": ""}"#,
        r#"{}"#,
    ] {
        let (status, body) = send(&app, "POST", "/api/links", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(body["error"], "Invalid url");
    }

    for payload in [
        r#"{"url": "https://a.com", "code": "ab"}"#,
        r#"{"url": "https://a.com", "code": "toolong123"}"#,
        r#"{"url": "https://a.com", "code": "bad-code"}"#,
    ] {
        let (status, body) = send(&app, "POST", "/api/links", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert!(body["error"].as_str().unwrap().contains("[A-Za-z0-9]{6,8}"));
    }

    let (_, links) = send(&app, "GET", "/api/links", None).await;
    assert_eq!(links.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_rejects_wrong_typed_fields() {
    let app = create_test_app();

    for payload in [
        r#"{"url": 5}"#,
        r#"{"url": ["https://a.com"]}"#,
        r#"{"url": 5, "code": 1234567}"#,
        r#"{"url": "https://a.com"#,
        r#""https://a.com""#,
    ] {
        let (status, body) = send(&app, "POST", "/api/links", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(body["error"], "Invalid url", "payload {payload}");
    }

    for payload in [
        r#"{"url": "https://a.com", "code": 1234567}"#,
        r#"{"url": "https://a.com", "code": 123}"#,
        r#"{"url": "https://a.com", "code": ["abc1234"]}"#,
    ] {
        let (status, body) = send(&app, "POST", "/api/links", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(
            body["error"], "Custom code must match [A-Za-z0-9]{6,8}",
            "payload {payload}"
        );
    }

    let (_, links) = send(&app, "GET", "/api/links", None).await;
    assert_eq!(links.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_requires_json_content_type() {
    let app = create_test_app();
    let payload = Some(r#"{"url": "https://a.com"}"#);

    for content_type in [None, Some("text/plain")] {
        let (status, body) =
            send_with_content_type(&app, "POST", "/api/links", content_type, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "content type {content_type:?}");
        assert_eq!(body["error"], "Invalid url");
    }

    let (status, _) = send_with_content_type(
        &app,
        "POST",
        "/api/links",
        Some("application/json; charset=utf-8"),
        payload,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_with_null_code_generates_one() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/links",
        Some(r#"{"url": "https://a.com", "code": null}"#),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(tinylink::validate::is_valid_code(body["code"].as_str().unwrap()));
}

#[tokio::test]
async fn test_create_conflict() {
    let app = create_test_app();
    let payload = r#"{"url": "https://first.com", "code": "taken01"}"#;

    let (status, _) = send(&app, "POST", "/api/links", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/links",
        Some(r#"{"url": "https://second.com", "code": "taken01"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Code already exists");

    let (_, link) = send(&app, "GET", "/api/links/taken01", None).await;
    assert_eq!(link["url"], "https://first.com");
}

#[tokio::test]
async fn test_reserved_code_conflicts() {
    let app = create_test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/links",
        Some(r#"{"url": "https://a.com", "code": "healthz"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_concurrent_custom_code_creation() {
    let app = create_test_app();
    let mut handles = vec![];

    for i in 0..10 {
        let app_clone = app.clone();
        handles.push(tokio::spawn(async move {
            let body = format!(r#"{{"url": "https://example.com/{i}", "code": "race001"}}"#);
            send(&app_clone, "POST", "/api/links", Some(body.as_str())).await.0
        }));
    }

    let mut success_count = 0;
    let mut conflict_count = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => success_count += 1,
            StatusCode::CONFLICT => conflict_count += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(success_count, 1, "Exactly one creation should succeed");
    assert_eq!(conflict_count, 9, "All others should get conflict (409)");
}

#[tokio::test]
async fn test_list_newest_first() {
    let app = create_test_app();
    for code in ["first01", "second1", "third01"] {
        let body = format!(r#"{{"url": "https://example.com/{code}", "code": "{code}"}}"#);
        let (status, _) = send(&app, "POST", "/api/links", Some(body.as_str())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/api/links", None).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["third01", "second1", "first01"]);
}

#[tokio::test]
async fn test_get_and_delete() {
    let app = create_test_app();
    send(
        &app,
        "POST",
        "/api/links",
        Some(r#"{"url": "https://example.com", "code": "delme01"}"#),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/links/delme01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "delme01");
    assert_eq!(body["clicks"], 0);
    assert!(body["lastClicked"].is_null());

    let (status, body) = send(&app, "DELETE", "/api/links/delme01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = send(&app, "GET", "/api/links/delme01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    let (status, _) = send(&app, "DELETE", "/api/links/delme01", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Storage whose backing database is unreachable.
struct UnreachableStorage;

fn unreachable() -> StorageError {
    StorageError::Unavailable(anyhow::anyhow!("connection refused"))
}

#[async_trait]
impl Storage for UnreachableStorage {
    async fn init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn insert(&self, _link: &Link) -> StorageResult<Link> {
        Err(unreachable())
    }

    async fn find_by_code(&self, _code: &str) -> StorageResult<Link> {
        Err(unreachable())
    }

    async fn list_all(&self) -> StorageResult<Vec<Link>> {
        Err(unreachable())
    }

    async fn increment_and_touch(&self, _code: &str, _now: DateTime<Utc>) -> StorageResult<Link> {
        Err(unreachable())
    }

    async fn delete_by_code(&self, _code: &str) -> StorageResult<Link> {
        Err(unreachable())
    }
}

#[tokio::test]
async fn test_storage_outage_returns_503() {
    let app = create_app(
        Arc::new(LinkRegistry::new(Arc::new(UnreachableStorage))),
        BASE_URL.to_string(),
    );

    for (method, uri, body) in [
        ("POST", "/api/links", Some(r#"{"url": "https://a.com"}"#)),
        ("POST", "/api/links", Some(r#"{"url": "https://a.com", "code": "abc1234"}"#)),
        ("GET", "/api/links", None),
        ("GET", "/api/links/abc1234", None),
        ("DELETE", "/api/links/abc1234", None),
    ] {
        let (status, json) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{method} {uri}");
        assert_eq!(json["error"], "Storage unavailable", "{method} {uri}");
    }

    // Redirects report the outage too instead of claiming the code is unknown.
    let (status, _) = send(&app, "GET", "/abc1234", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // The process itself is still healthy.
    let (status, _) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
}
