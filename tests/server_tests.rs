//! End-to-end tests against a live server on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use item_cache_service::cache::{CacheClient, MemoryStore};
use item_cache_service::config::{CacheBackend, Config};
use item_cache_service::items::MemoryItemStore;
use item_cache_service::server::{build_router, AppState};
use item_cache_service::telemetry::metrics::Metrics;

/// Serve the full router on 127.0.0.1:0 and return its base URL.
async fn spawn_server() -> String {
    let mut config = Config::default();
    config.cache.backend = CacheBackend::Memory;

    let cache = CacheClient::with_store(Arc::new(MemoryStore::new()), Duration::from_secs(1));
    let state = AppState::new(
        Arc::new(config),
        Arc::new(MemoryItemStore::new()),
        Arc::new(cache),
        Arc::new(Metrics::new().unwrap()),
    );
    let app = build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_crud_over_http() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/v1/items"))
        .json(&json!({"name": "Widget", "price": 9.99, "tags": ["x"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    assert!(response.headers().contains_key("x-request-id"));
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_str().unwrap();

    let fetched: Value = client
        .get(format!("{base}/api/v1/items/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    let response = client
        .put(format!("{base}/api/v1/items/{id}"))
        .json(&json!({"quantity": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["quantity"], 4);
    assert_eq!(updated["tags"], json!(["x"]));

    let response = client
        .delete(format!("{base}/api/v1/items/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{base}/api/v1/items/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_request_id_round_trip_over_http() {
    let base = spawn_server().await;

    let response = reqwest::Client::new()
        .get(format!("{base}/healthz"))
        .header("X-Request-ID", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-request-id"], "trace-me");
    assert!(response.headers().contains_key("x-response-time"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let base = spawn_server().await;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/api/v1/items"))
        .header("Origin", "http://example.com")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
