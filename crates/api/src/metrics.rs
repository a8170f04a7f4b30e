// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter_vec,
};

/// Outcome label for a relayed dataset
pub const OUTCOME_SUCCESS: &str = "success";

/// Outcome label for a request without a committee
pub const OUTCOME_MISSING_COMMITTEE: &str = "missing_committee";

/// Total number of committee requests, labeled by outcome.
pub static COMMITTEE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "committee_proxy_requests_total",
        "Total number of committee requests, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create committee_proxy_requests_total counter vec")
});

/// Histogram for upstream request durations in seconds.
pub static UPSTREAM_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "committee_proxy_upstream_request_duration_seconds",
        "Upstream request durations in seconds",
        &["result"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to create upstream request duration histogram")
});

/// Increment the committee request counter
///
/// # Arguments
/// * `outcome` - `success`, `missing_committee`, or an upstream failure kind
pub fn inc_committee_requests(outcome: &str) {
    COMMITTEE_REQUESTS.with_label_values(&[outcome]).inc();
}

/// Observe the duration of an upstream request
///
/// # Arguments
/// * `result` - `success` or `failure`
/// * `duration_secs` - The duration of the request in seconds
pub fn observe_upstream_duration(result: &str, duration_secs: f64) {
    UPSTREAM_REQUEST_DURATION
        .with_label_values(&[result])
        .observe(duration_secs);
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
