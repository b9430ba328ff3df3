//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection and frame metrics
//! - Registered connection count (collected at scrape time)
//!
//! Core metrics (jobs, stages, notifications) are registered alongside.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stemsplit_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stemsplit_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stemsplit_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stemsplit_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stemsplit_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket connections refused because registration failed.
pub static WS_CONNECTIONS_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stemsplit_ws_connections_rejected_total",
        "WebSocket connections closed because registration failed",
    )
    .unwrap()
});

/// Inbound frames by route and response status.
pub static WS_FRAMES_RECEIVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stemsplit_ws_frames_received_total",
            "WebSocket text frames received",
        ),
        &["route", "status"],
    )
    .unwrap()
});

// =============================================================================
// Registry Metrics (collected dynamically)
// =============================================================================

/// Registered connections.
pub static CONNECTIONS_REGISTERED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stemsplit_connections_registered",
        "Connections currently present in the registry",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let server_metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        // WebSocket
        Box::new(WS_CONNECTIONS_ACTIVE.clone()),
        Box::new(WS_CONNECTIONS_TOTAL.clone()),
        Box::new(WS_CONNECTIONS_REJECTED.clone()),
        Box::new(WS_FRAMES_RECEIVED.clone()),
        // Registry
        Box::new(CONNECTIONS_REGISTERED.clone()),
    ];

    for metric in server_metrics
        .into_iter()
        .chain(stemsplit_core::metrics::all_metrics())
    {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(count) = state.registry().count().await {
        CONNECTIONS_REGISTERED.set(count as i64);
    }
}
