//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (batches, encodes by format and result)
//! - Worker pool occupancy

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Orchestrator - Batch Metrics
// =============================================================================

/// Batches accepted by the orchestrator.
pub static BATCHES_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("soundshift_batches_started_total", "Total batches started").unwrap()
});

/// Files submitted across all batches.
pub static FILES_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "soundshift_files_submitted_total",
        "Total files submitted for conversion",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator - Encode Metrics
// =============================================================================

/// Encodes started by target format.
pub static ENCODES_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("soundshift_encodes_started_total", "Total encodes started"),
        &["format"],
    )
    .unwrap()
});

/// Encodes finished by target format and result.
pub static ENCODES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("soundshift_encodes_total", "Total encodes finished"),
        &["format", "result"], // result: "success", "failure"
    )
    .unwrap()
});

/// Encode duration in seconds.
pub static ENCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "soundshift_encode_duration_seconds",
            "Duration of a single encode",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 3600.0]),
        &["format", "result"],
    )
    .unwrap()
});

/// Bytes written by successful encodes.
pub static OUTPUT_BYTES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "soundshift_output_bytes_total",
            "Total bytes written by successful encodes",
        ),
        &["format"],
    )
    .unwrap()
});

// =============================================================================
// Worker Pool Metrics
// =============================================================================

/// Encodes currently holding a worker slot.
pub static ACTIVE_ENCODES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("soundshift_active_encodes", "Encodes currently running").unwrap()
});

/// Files waiting for a worker slot.
pub static QUEUED_ENCODES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "soundshift_queued_encodes",
        "Files waiting for a worker slot",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Batches
        Box::new(BATCHES_STARTED.clone()),
        Box::new(FILES_SUBMITTED.clone()),
        // Encodes
        Box::new(ENCODES_STARTED.clone()),
        Box::new(ENCODES_TOTAL.clone()),
        Box::new(ENCODE_DURATION.clone()),
        Box::new(OUTPUT_BYTES.clone()),
        // Pool
        Box::new(ACTIVE_ENCODES.clone()),
        Box::new(QUEUED_ENCODES.clone()),
    ]
}
