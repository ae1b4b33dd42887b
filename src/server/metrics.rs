use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all songclip metrics
const PREFIX: &str = "songclip";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Play requests
    pub static ref PLAY_OUTCOMES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_play_outcomes_total"), "Play requests by outcome code"),
        &["code"]
    ).expect("Failed to create play_outcomes_total metric");

    pub static ref CATALOG_QUERY_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_catalog_query_duration_seconds"),
            "Catalog query duration in seconds"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0]),
        &["operation"]
    ).expect("Failed to create catalog_query_duration_seconds metric");

    // Variant table
    pub static ref VARIANT_TABLE_SIZE: Gauge = Gauge::new(
        format!("{PREFIX}_variant_table_size"),
        "Number of variants in the served table"
    ).expect("Failed to create variant_table_size metric");

    pub static ref SNAPSHOT_REFRESHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_snapshot_refreshes_total"), "Snapshot refreshes by outcome"),
        &["outcome"]
    ).expect("Failed to create snapshot_refreshes_total metric");

    pub static ref CATALOG_SONGS: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_songs"),
        "Number of songs in the catalog"
    ).expect("Failed to create catalog_songs metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Registering twice fails, which happens across tests
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(PLAY_OUTCOMES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_QUERY_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(VARIANT_TABLE_SIZE.clone()));
    let _ = REGISTRY.register(Box::new(SNAPSHOT_REFRESHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_SONGS.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn set_catalog_songs(count: usize) {
    CATALOG_SONGS.set(count as f64);
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record how a play request ended, `OK` or an error code.
pub fn record_play_outcome(code: &str) {
    PLAY_OUTCOMES_TOTAL.with_label_values(&[code]).inc();
}

pub fn record_catalog_query(operation: &str, duration: Duration) {
    CATALOG_QUERY_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

pub fn set_variant_table_size(size: usize) {
    VARIANT_TABLE_SIZE.set(size as f64);
}

pub fn record_snapshot_refresh(outcome: &str) {
    SNAPSHOT_REFRESHES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
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
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
