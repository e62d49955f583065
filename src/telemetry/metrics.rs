//! Prometheus metrics for the HTTP layer and the cache-aside path.
//!
//! Metrics live in a registry owned by [`Metrics`] rather than the global
//! default registry, so several instances (e.g. one per test router) can coexist.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

/// HTTP request latency buckets (seconds): 5ms .. 10s.
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub struct Metrics {
    registry: Registry,

    /// labels: method, endpoint, status_code
    pub http_requests_total: IntCounterVec,

    /// labels: method, endpoint
    pub http_request_duration_seconds: HistogramVec,

    /// labels: method, endpoint
    pub http_requests_in_progress: IntGaugeVec,

    /// labels: operation
    pub cache_hits_total: IntCounterVec,

    /// labels: operation
    pub cache_misses_total: IntCounterVec,

    pub items_created_total: IntCounter,

    pub items_deleted_total: IntCounter,
}

impl Metrics {
    /// Create every metric and register it with a fresh registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status_code"],
        )?;
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(HTTP_LATENCY_BUCKETS.to_vec()),
            &["method", "endpoint"],
        )?;
        let http_requests_in_progress = IntGaugeVec::new(
            Opts::new(
                "http_requests_in_progress",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;
        let cache_hits_total = IntCounterVec::new(
            Opts::new("cache_hits_total", "Total cache hits"),
            &["operation"],
        )?;
        let cache_misses_total = IntCounterVec::new(
            Opts::new("cache_misses_total", "Total cache misses"),
            &["operation"],
        )?;
        let items_created_total = IntCounter::new("items_created_total", "Total items created")?;
        let items_deleted_total = IntCounter::new("items_deleted_total", "Total items deleted")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_progress.clone()))?;
        registry.register(Box::new(cache_hits_total.clone()))?;
        registry.register(Box::new(cache_misses_total.clone()))?;
        registry.register(Box::new(items_created_total.clone()))?;
        registry.register(Box::new(items_deleted_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_progress,
            cache_hits_total,
            cache_misses_total,
            items_created_total,
            items_deleted_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a finished HTTP request.
    pub fn record_http_request(&self, method: &str, endpoint: &str, status: u16, duration_secs: f64) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, endpoint, status.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_secs);
    }

    pub fn request_started(&self, method: &str, endpoint: &str) {
        self.http_requests_in_progress
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn request_finished(&self, method: &str, endpoint: &str) {
        self.http_requests_in_progress
            .with_label_values(&[method, endpoint])
            .dec();
    }

    pub fn record_cache_hit(&self, operation: &str) {
        self.cache_hits_total.with_label_values(&[operation]).inc();
    }

    pub fn record_cache_miss(&self, operation: &str) {
        self.cache_misses_total.with_label_values(&[operation]).inc();
    }

    pub fn record_item_created(&self) {
        self.items_created_total.inc();
    }

    pub fn record_item_deleted(&self) {
        self.items_deleted_total.inc();
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Content type of [`encode`](Self::encode) output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}
