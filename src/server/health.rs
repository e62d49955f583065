//! Kubernetes-style health probes.
//!
//! - GET /healthz: liveness, always healthy while the process serves requests
//! - GET /readyz: readiness, checks dependencies
//! - GET /health: readiness plus service identity and uptime
//!
//! The cache is optional, so a failing cache marks the service `degraded`
//! but keeps readiness at 200. Only a failing required dependency yields 503.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::CacheBackend;
use crate::server::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    /// Whether the service can function without this component.
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub checks: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    pub service: String,
    pub version: String,
    pub environment: String,
    pub uptime_secs: u64,
    #[serde(flatten)]
    pub readiness: ReadinessResponse,
}

/// Fold component checks into an overall status.
pub fn overall_status(checks: &BTreeMap<String, ComponentHealth>) -> HealthStatus {
    let unhealthy = |c: &&ComponentHealth| c.status == HealthStatus::Unhealthy;
    if checks.values().filter(unhealthy).any(|c| c.required) {
        HealthStatus::Unhealthy
    } else if checks.values().any(|c| unhealthy(&c)) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

fn cache_check_name(backend: CacheBackend) -> &'static str {
    match backend {
        CacheBackend::Redis => "redis",
        CacheBackend::Memory => "memory",
        CacheBackend::Disabled => "cache",
    }
}

async fn check_readiness(state: &AppState) -> (StatusCode, ReadinessResponse) {
    let mut checks = BTreeMap::new();

    let cache = match state.cache.check().await {
        Ok(latency) => ComponentHealth {
            status: HealthStatus::Healthy,
            required: false,
            latency_ms: Some(latency.as_millis() as u64),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "Cache health check failed");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                required: false,
                latency_ms: None,
                error: Some(e.to_string()),
            }
        }
    };
    checks.insert(
        cache_check_name(state.config.cache.backend).to_string(),
        cache,
    );

    let status = overall_status(&checks);
    let code = if status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (code, ReadinessResponse { status, checks })
}

pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: HealthStatus::Healthy,
    })
}

pub async fn readiness(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let (code, response) = check_readiness(&state).await;
    (code, Json(response))
}

pub async fn health_detailed(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<DetailedHealthResponse>) {
    let (code, readiness) = check_readiness(&state).await;
    (
        code,
        Json(DetailedHealthResponse {
            service: state.config.app.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.config.app.environment.to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
            readiness,
        }),
    )
}
