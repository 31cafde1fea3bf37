//! Prometheus metrics for creator-scout
//!
//! This module tracks requests, retries, dedup outcomes, admissions and
//! enrichment results for a crawl.
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! Before that, or if initialization fails, recording functions are no-ops.

use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all crawl metrics
struct ScoutMetrics {
    requests: CounterVec,
    retries: CounterVec,
    videos: CounterVec,
    admissions: CounterVec,
    enrichment: CounterVec,
    run_duration: HistogramVec,
}

static METRICS: OnceLock<ScoutMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

/// Why a creator was or was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Duplicate,
    BelowThreshold,
    NoIdentity,
}

impl Admission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::Duplicate => "duplicate",
            Self::BelowThreshold => "below_threshold",
            Self::NoIdentity => "no_identity",
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = ScoutMetrics {
        requests: register_counter_vec!(
            "scout_requests_total",
            "Upstream requests by endpoint and outcome",
            &["endpoint", "outcome"]
        )?,
        retries: register_counter_vec!(
            "scout_retries_total",
            "Retried upstream requests by endpoint",
            &["endpoint"]
        )?,
        videos: register_counter_vec!(
            "scout_videos_total",
            "Search result videos by dedup outcome",
            &["outcome"]
        )?,
        admissions: register_counter_vec!(
            "scout_admissions_total",
            "Creator admission decisions",
            &["outcome"]
        )?,
        enrichment: register_counter_vec!(
            "scout_enrichment_total",
            "Creator enrichment results",
            &["outcome"]
        )?,
        run_duration: register_histogram_vec!(
            "scout_keyword_run_duration_seconds",
            "Time spent on one keyword in seconds",
            &["status"],
            vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0]
        )?,
    };

    METRICS.set(metrics).map_err(|_| "Metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record one finished request (after retries)
pub fn record_request(endpoint: &str, success: bool) {
    if let Some(m) = METRICS.get() {
        let outcome = if success { "success" } else { "failure" };
        m.requests.with_label_values(&[endpoint, outcome]).inc();
    }
}

/// Record a retry of a request
pub fn record_retry(endpoint: &str) {
    if let Some(m) = METRICS.get() {
        m.retries.with_label_values(&[endpoint]).inc();
    }
}

/// Record dedup results for one page
pub fn record_videos(new_videos: usize, duplicates: usize) {
    let Some(m) = METRICS.get() else {
        return;
    };

    if new_videos > 0 {
        m.videos
            .with_label_values(&["new"])
            .inc_by(new_videos as f64);
    }
    if duplicates > 0 {
        m.videos
            .with_label_values(&["duplicate"])
            .inc_by(duplicates as f64);
    }
}

/// Record an admission decision
pub fn record_admission(outcome: Admission) {
    if let Some(m) = METRICS.get() {
        m.admissions.with_label_values(&[outcome.as_str()]).inc();
    }
}

/// Record the result of enriching one creator
pub fn record_enrichment(success: bool) {
    if let Some(m) = METRICS.get() {
        let outcome = if success { "success" } else { "failure" };
        m.enrichment.with_label_values(&[outcome]).inc();
    }
}

/// Record how long a keyword run took
pub fn record_run_duration(status: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.run_duration
            .with_label_values(&[status])
            .observe(duration_secs);
    }
}

// ============================================================================
// Tests
// ============================================================================
