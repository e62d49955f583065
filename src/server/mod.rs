//! HTTP server for the items API.
//!
//! - [`items`]: CRUD handlers under `/api/v1/items`
//! - [`health`]: liveness, readiness and detailed health probes
//! - [`middleware`]: request-id propagation and request metrics
//! - [`error`]: error-to-response mapping

pub mod error;
pub mod health;
pub mod items;
pub mod middleware;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::cache::CacheClient;
use crate::config::Config;
use crate::items::{ItemRepository, ItemService};
use crate::telemetry::metrics::Metrics;

use middleware::{REQUEST_ID_HEADER, RESPONSE_TIME_HEADER};

/// Shared application state.
pub struct AppState {
    pub items: ItemService,
    pub cache: Arc<CacheClient>,
    pub metrics: Arc<Metrics>,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ItemRepository>,
        cache: Arc<CacheClient>,
        metrics: Arc<Metrics>,
    ) -> Arc<Self> {
        let items = ItemService::new(
            store,
            cache.clone(),
            metrics.clone(),
            config.cache.entity_ttl(),
        );
        Arc::new(Self {
            items,
            cache,
            metrics,
            config,
            start_time: Instant::now(),
        })
    }
}

/// Build the axum router with all routes and layers.
///
/// Layers run outermost first: CORS, HTTP trace, request id, metrics.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/items",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/items/{item_id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        );

    Router::new()
        .route("/", get(root))
        .route("/healthz", get(health::liveness))
        .route("/readyz", get(health::readiness))
        .route("/health", get(health::health_detailed))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn_with_state(
            state.metrics.clone(),
            middleware::track_metrics,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let expose = [
        HeaderName::from_static(REQUEST_ID_HEADER),
        HeaderName::from_static(RESPONSE_TIME_HEADER),
    ];
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(expose);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub environment: String,
}

async fn root(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: state.config.app.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.app.environment.to_string(),
    })
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(body) => ([(CONTENT_TYPE, state.metrics.content_type())], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
