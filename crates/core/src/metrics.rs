//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Provider traffic (requests, retries, latency)
//! - Assistant routing (which provider family answered)
//! - OCR arbitration and asynchronous polling jobs
//! - Substitution ranking

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Provider Metrics
// =============================================================================

/// Logical provider requests by terminal outcome.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "apothecary_provider_requests_total",
            "Total logical provider requests",
        ),
        &["provider", "outcome"], // "success", "rate_limited", "error"
    )
    .unwrap()
});

/// Retries issued by the retry executor.
pub static PROVIDER_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("apothecary_provider_retries_total", "Total provider retries"),
        &["provider"],
    )
    .unwrap()
});

/// Duration of a logical provider request including backoff.
pub static PROVIDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "apothecary_provider_duration_seconds",
            "Duration of logical provider requests including retries",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["provider"],
    )
    .unwrap()
});

// =============================================================================
// Assistant Metrics
// =============================================================================

/// Assistant responses by source.
pub static ROUTE_RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "apothecary_route_responses_total",
            "Assistant responses by answering source",
        ),
        &["source"], // "knowledge_base", "general_completion", "canned"
    )
    .unwrap()
});

// =============================================================================
// OCR Metrics
// =============================================================================

/// OCR arbitrations by winning provider.
pub static OCR_ARBITRATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "apothecary_ocr_arbitrations_total",
            "OCR arbitrations by winning provider",
        ),
        &["winner"], // provider name or "none"
    )
    .unwrap()
});

/// Asynchronous polling jobs by terminal state.
pub static POLLING_JOBS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "apothecary_polling_jobs_total",
            "Asynchronous provider jobs by terminal state",
        ),
        &["outcome"], // "succeeded", "failed", "timed_out"
    )
    .unwrap()
});

// =============================================================================
// Substitution Metrics
// =============================================================================

/// Ranked substitute list sizes.
pub static SUBSTITUTION_CANDIDATES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "apothecary_substitution_candidates",
            "Number of ranked substitutes returned per request",
        )
        .buckets(vec![0.0, 1.0, 3.0, 5.0, 10.0, 25.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Providers
        Box::new(PROVIDER_REQUESTS.clone()),
        Box::new(PROVIDER_RETRIES.clone()),
        Box::new(PROVIDER_DURATION.clone()),
        // Assistant
        Box::new(ROUTE_RESPONSES.clone()),
        // OCR
        Box::new(OCR_ARBITRATIONS.clone()),
        Box::new(POLLING_JOBS.clone()),
        // Substitution
        Box::new(SUBSTITUTION_CANDIDATES.clone()),
    ]
}
