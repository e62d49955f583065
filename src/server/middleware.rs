//! Request-scoped middleware.
//!
//! - [`request_id`]: correlates every request with an id, echoes it back, and
//!   logs start and completion inside a span carrying that id
//! - [`track_metrics`]: Prometheus request counters, latency and in-flight gauge

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::telemetry::metrics::Metrics;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const RESPONSE_TIME_HEADER: &str = "x-response-time";

/// Correlation id of the current request, available to handlers as
/// `Extension<RequestId>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reuse a non-empty incoming `X-Request-ID` or mint a UUID v4.
fn incoming_or_new(request: &Request) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn request_id(mut request: Request, next: Next) -> Response {
    let start = Instant::now();
    let id = incoming_or_new(&request);

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client = client_ip(&request);

    request.extensions_mut().insert(RequestId(id.clone()));

    let span = info_span!("request", request_id = %id);
    async move {
        info!(method = %method, path = %path, client_ip = %client, "Request started");

        let mut response = next.run(request).await;

        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        info!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            duration_ms = (duration_ms * 100.0).round() / 100.0,
            "Request completed"
        );

        let headers = response.headers_mut();
        match HeaderValue::from_str(&id) {
            Ok(value) => {
                headers.insert(REQUEST_ID_HEADER, value);
            }
            Err(_) => warn!("Request id is not a valid header value"),
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{duration_ms:.2}ms")) {
            headers.insert(RESPONSE_TIME_HEADER, value);
        }

        response
    }
    .instrument(span)
    .await
}

/// Record request metrics labelled by the matched route template, so
/// `/api/v1/items/{item_id}` is one series regardless of id. Unmatched
/// requests fall back to the raw path.
pub async fn track_metrics(
    State(metrics): State<Arc<Metrics>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if path == "/metrics" {
        return next.run(request).await;
    }

    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or(path);
    let method = request.method().as_str().to_string();

    let in_flight = InFlight::start(metrics.clone(), method, endpoint);
    let start = Instant::now();

    let response = next.run(request).await;

    metrics.record_http_request(
        &in_flight.method,
        &in_flight.endpoint,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// Holds one slot of `http_requests_in_progress`. The slot is released on
/// drop, so a request future cancelled mid-flight still decrements the gauge.
struct InFlight {
    metrics: Arc<Metrics>,
    method: String,
    endpoint: String,
}

impl InFlight {
    fn start(metrics: Arc<Metrics>, method: String, endpoint: String) -> Self {
        metrics.request_started(&method, &endpoint);
        Self {
            metrics,
            method,
            endpoint,
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.metrics.request_finished(&self.method, &self.endpoint);
    }
}
