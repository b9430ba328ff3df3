//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Jobs (outcomes, stage durations)
//! - Separator runs
//! - Notifications pushed to clients
//! - Connection registry operations

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs finished, by outcome ("succeeded" or the failure kind).
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stemsplit_jobs_total", "Total jobs by outcome"),
        &["outcome"],
    )
    .unwrap()
});

/// Time spent in each job stage.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stemsplit_stage_duration_seconds",
            "Duration of job stages",
        )
        .buckets(vec![
            0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0,
        ]),
        &["stage", "result"],
    )
    .unwrap()
});

// =============================================================================
// Separator Metrics
// =============================================================================

/// Separator runs by backend and result.
pub static SEPARATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stemsplit_separations_total", "Total separator runs"),
        &["backend", "result"],
    )
    .unwrap()
});

// =============================================================================
// Notification Metrics
// =============================================================================

/// Notifications pushed, by status and delivery result.
pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stemsplit_notifications_total",
            "Notifications pushed to client connections",
        ),
        &["status", "result"], // result: "delivered", "failed"
    )
    .unwrap()
});

// =============================================================================
// Registry Metrics
// =============================================================================

/// Registry operations by kind and result.
pub static REGISTRY_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stemsplit_registry_operations_total",
            "Connection registry operations",
        ),
        &["operation", "result"],
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(SEPARATIONS_TOTAL.clone()),
        Box::new(NOTIFICATIONS_TOTAL.clone()),
        Box::new(REGISTRY_OPERATIONS.clone()),
    ]
}
