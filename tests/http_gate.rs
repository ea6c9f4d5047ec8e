//! In-process tests of the router's gates.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;
use workflow_gate::http::HttpServer;

mod common;

const CLIENT: &str = "192.168.1.10";

#[tokio::test]
async fn test_health_reports_healthy() {
    let tmp = tempfile::tempdir().unwrap();
    let app = HttpServer::new(common::test_config(tmp.path(), 60)).router();

    let response = app.oneshot(common::get_from(CLIENT, "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_serves_valid_workflow_file() {
    let tmp = tempfile::tempdir().unwrap();
    common::write_workflow(tmp.path(), "workflow-123.json", r#"{"name":"demo"}"#);
    let app = HttpServer::new(common::test_config(tmp.path(), 60)).router();

    let response = app
        .oneshot(common::get_from(CLIENT, "/api/workflows/workflow-123.json/download"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"workflow-123.json\""
    );
    assert_eq!(common::body_string(response).await, r#"{"name":"demo"}"#);
}

#[tokio::test]
async fn test_missing_workflow_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let app = HttpServer::new(common::test_config(tmp.path(), 60)).router();

    let response = app
        .oneshot(common::get_from(CLIENT, "/api/workflows/absent.json/download"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Workflow file 'absent.json' not found");
}

#[tokio::test]
async fn test_unsafe_filenames_are_rejected_before_filesystem() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("secret.json"), "{}").unwrap();
    common::write_workflow(tmp.path(), "notes.txt", "plain");
    let app = HttpServer::new(common::test_config(tmp.path(), 100)).router();

    for uri in [
        "/api/workflows/..%2Fsecret.json/download",
        "/api/workflows/%2e%2e%2fsecret.json/download",
        "/api/workflows/%252e%252e%252f/download",
        "/api/workflows/..%5Csecret.json/download",
        "/api/workflows/file%3Brm%20-rf.json/download",
        "/api/workflows/%24HOME.json/download",
        "/api/workflows/notes.txt/download",
        "/api/workflows/C%3Afile.json/download",
    ] {
        let response = app.clone().oneshot(common::get_from(CLIENT, uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = common::body_json(response).await;
        assert_eq!(body["error"], "Invalid filename", "{uri}");
    }
}

#[tokio::test]
async fn test_rate_limit_rejects_over_budget_client() {
    let tmp = tempfile::tempdir().unwrap();
    let app = HttpServer::new(common::test_config(tmp.path(), 3)).router();

    for _ in 0..3 {
        let response = app.clone().oneshot(common::get_from("10.0.0.1", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(common::get_from("10.0.0.1", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(common::body_string(response).await, "Rate limit exceeded");

    let other = app.oneshot(common::get_from("10.0.0.2", "/health")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_counts_rejected_filenames_too() {
    let tmp = tempfile::tempdir().unwrap();
    let app = HttpServer::new(common::test_config(tmp.path(), 2)).router();
    let uri = "/api/workflows/..%2Fx/download";

    for _ in 0..2 {
        let response = app.clone().oneshot(common::get_from(CLIENT, uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    let response = app.oneshot(common::get_from(CLIENT, uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_disabled_rate_limit_admits_everything() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = common::test_config(tmp.path(), 1);
    config.rate_limit.enabled = false;
    let app = HttpServer::new(config).router();

    for _ in 0..20 {
        let response = app.clone().oneshot(common::get_from(CLIENT, "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_requests_without_peer_address_share_one_bucket() {
    let tmp = tempfile::tempdir().unwrap();
    let app = HttpServer::new(common::test_config(tmp.path(), 1)).router();
    let bare = || Request::builder().uri("/health").body(Body::empty()).unwrap();

    assert_eq!(app.clone().oneshot(bare()).await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        app.oneshot(bare()).await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test]
async fn test_cors_preflight_allows_listed_origin_only() {
    let tmp = tempfile::tempdir().unwrap();
    let app = HttpServer::new(common::test_config(tmp.path(), 60)).router();
    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/health")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app.clone().oneshot(preflight("http://localhost:3000")).await.unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let denied = app.oneshot(preflight("http://evil.example")).await.unwrap();
    assert!(!denied.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
