use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all marketplace metrics
const PREFIX: &str = "mcp_marketplace";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Authentication Metrics
    pub static ref AUTH_LOGIN_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_login_attempts_total"), "Total login attempts"),
        &["status"]
    ).expect("Failed to create auth_login_attempts_total metric");

    pub static ref AUTH_LOGIN_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_auth_login_duration_seconds"),
            "Login request duration in seconds"
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0])
    ).expect("Failed to create auth_login_duration_seconds metric");

    // Deployment Metrics
    pub static ref DEPLOYMENTS_CREATED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_deployments_created_total"), "Deployments created per catalog entry"),
        &["mcp"]
    ).expect("Failed to create deployments_created_total metric");

    pub static ref DEPLOYMENT_STATUS_TRANSITIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_deployment_status_transitions_total"), "Deployment status changes by target status"),
        &["status"]
    ).expect("Failed to create deployment_status_transitions_total metric");

    // Catalog Metrics
    pub static ref CATALOG_ENTRIES_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_entries_total"),
        "Number of entries in the catalog"
    ).expect("Failed to create catalog_entries_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total error responses by type"),
        &["error_type", "status"]
    ).expect("Failed to create errors_total metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Already registered metrics are ignored, tests call this repeatedly.
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(DEPLOYMENTS_CREATED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DEPLOYMENT_STATUS_TRANSITIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_ENTRIES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Collapses ids and slugs in a request path so that label cardinality stays
/// bounded.
pub fn path_label(path: &str) -> String {
    if !path.starts_with("/api/") {
        return if path == "/" { "/".to_string() } else { "static".to_string() };
    }
    let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if i > 0 && segments[i - 1] == "mcps" {
                ":slug"
            } else if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_login_attempt(success: bool, duration: Duration) {
    let status = if success { "success" } else { "failure" };
    AUTH_LOGIN_ATTEMPTS_TOTAL.with_label_values(&[status]).inc();
    AUTH_LOGIN_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_deployment_created(mcp_slug: &str) {
    DEPLOYMENTS_CREATED_TOTAL
        .with_label_values(&[mcp_slug])
        .inc();
}

pub fn record_status_transition(status: &str) {
    DEPLOYMENT_STATUS_TRANSITIONS_TOTAL
        .with_label_values(&[status])
        .inc();
}

pub fn set_catalog_entries(count: usize) {
    CATALOG_ENTRIES_TOTAL.set(count as f64);
}

pub fn record_error(error_type: &str, status: u16) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, &status.to_string()])
        .inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
            return;
        };
        let rss_kb = status
            .lines()
            .find(|line| line.starts_with("VmRSS:"))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|kb| kb.parse::<f64>().ok());
        if let Some(kb) = rss_kb {
            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            String::from_utf8(buffer).unwrap_or_default(),
        ),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
