//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response};
use workflow_gate::config::GatewayConfig;

/// Default config rooted in `root`, with a small rate limit budget.
pub fn test_config(root: &Path, max_requests: usize) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.storage.root = root.to_path_buf();
    config.rate_limit.max_requests = max_requests;
    config
}

/// A GET request that looks like it arrived from `ip`.
pub fn get_from(ip: &str, uri: &str) -> Request<Body> {
    let addr: SocketAddr = format!("{ip}:40000").parse().unwrap();
    let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

/// Write a workflow file under `root/workflows`.
pub fn write_workflow(root: &Path, name: &str, contents: &str) {
    let dir = root.join("workflows");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}
