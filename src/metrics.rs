//! Metrics for validation, token acquisition and rate limiting.
//!
//! Recording is a no-op until the embedding application installs a
//! `metrics` recorder.

use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Time spent waiting on the rate limiter.
pub const METRIC_RATE_LIMIT_WAIT: &str = "rate_limit_wait_ms";
/// Trades validated counter metric name.
pub const METRIC_TRADES_VALIDATED: &str = "trades_validated_total";
/// Trades rejected by validation counter metric name.
pub const METRIC_TRADES_REJECTED: &str = "trades_rejected_total";
/// Form tokens fetched counter metric name.
pub const METRIC_FORM_TOKENS_FETCHED: &str = "form_tokens_fetched_total";
/// Form token fetch failures counter metric name.
pub const METRIC_FORM_TOKEN_FAILURES: &str = "form_token_failures_total";
/// Rate limiter refusals counter metric name.
pub const METRIC_RATE_LIMIT_REJECTIONS: &str = "rate_limit_rejections_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_RATE_LIMIT_WAIT,
        "Time spent waiting for rate limiter capacity in milliseconds"
    );

    describe_counter!(METRIC_TRADES_VALIDATED, "Total number of trades that passed validation");
    describe_counter!(METRIC_TRADES_REJECTED, "Total number of trades rejected by validation");
    describe_counter!(METRIC_FORM_TOKENS_FETCHED, "Total number of form tokens fetched");
    describe_counter!(
        METRIC_FORM_TOKEN_FAILURES,
        "Total number of failed form token fetches"
    );
    describe_counter!(
        METRIC_RATE_LIMIT_REJECTIONS,
        "Total number of calls refused because the rate limit wait was too long"
    );

    debug!("Metrics initialized");
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, route: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "route" => route.to_string()).record(latency_ms);
}

/// Record time spent throttled.
pub fn record_rate_limit_wait(waited: Duration) {
    histogram!(METRIC_RATE_LIMIT_WAIT).record(waited.as_secs_f64() * 1000.0);
}

pub fn inc_trades_validated() {
    counter!(METRIC_TRADES_VALIDATED).increment(1);
}

pub fn inc_trades_rejected() {
    counter!(METRIC_TRADES_REJECTED).increment(1);
}

pub fn inc_form_tokens_fetched() {
    counter!(METRIC_FORM_TOKENS_FETCHED).increment(1);
}

pub fn inc_form_token_failures() {
    counter!(METRIC_FORM_TOKEN_FAILURES).increment(1);
}

pub fn inc_rate_limit_rejections() {
    counter!(METRIC_RATE_LIMIT_REJECTIONS).increment(1);
}
