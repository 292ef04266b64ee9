//! Prometheus metrics for order execution.
//!
//! # Panics
//!
//! Registration panics on first use if a metric name is registered twice.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Histogram,
    IntCounter, TextEncoder,
};

/// Orders accepted by the exchange.
/// Labels: side (buy/sell), leg (take_profit/runner)
pub static ORDERS_SUBMITTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigx_orders_submitted_total",
        "Orders accepted by the exchange",
        &["side", "leg"]
    )
    .unwrap()
});

/// Orders that failed submission.
/// Labels: side, kind (error kind)
pub static ORDERS_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigx_orders_rejected_total",
        "Orders that failed submission",
        &["side", "kind"]
    )
    .unwrap()
});

/// Confirmation waits by terminal outcome.
/// Labels: outcome (confirmed/timed_out/stream_closed)
pub static CONFIRMATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigx_confirmations_total",
        "Confirmation waits by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Set-leverage calls that failed and aborted an execution.
pub static LEVERAGE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "sigx_leverage_failures_total",
        "Set-leverage failures (execution aborted)"
    )
    .unwrap()
});

/// Submission-to-stream latency per confirmed order.
pub static CONFIRMATION_LATENCY_MS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "sigx_confirmation_latency_ms",
        "Time from tracking start to stream confirmation in milliseconds",
        vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap()
});

/// Executions by final report outcome.
/// Labels: outcome
pub static EXECUTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "sigx_executions_total",
        "Executions by final outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Metrics helper.
pub struct Metrics;

impl Metrics {
    pub fn order_submitted(side: &str, leg: &str) {
        ORDERS_SUBMITTED_TOTAL.with_label_values(&[side, leg]).inc();
    }

    pub fn order_rejected(side: &str, kind: &str) {
        ORDERS_REJECTED_TOTAL.with_label_values(&[side, kind]).inc();
    }

    pub fn confirmation_outcome(outcome: &str) {
        CONFIRMATIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn confirmation_latency(latency_ms: f64) {
        CONFIRMATION_LATENCY_MS.observe(latency_ms);
    }

    pub fn leverage_failed() {
        LEVERAGE_FAILURES_TOTAL.inc();
    }

    pub fn execution_finished(outcome: &str) {
        EXECUTIONS_TOTAL.with_label_values(&[outcome]).inc();
    }
}

/// Render the default registry in the text exposition format.
pub fn gather_text() -> TelemetryResult<String> {
    Ok(TextEncoder::new().encode_to_string(&prometheus::gather())?)
}
