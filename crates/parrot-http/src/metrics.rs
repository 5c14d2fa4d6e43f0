//! Prometheus metrics for parrot-http.
//!
//! Tracks captured requests, capture store activity and slow-drip streams.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, Encoder,
    IntCounter, IntGauge, TextEncoder,
};

lazy_static! {
    /// Requests answered by the capture endpoint
    pub static ref REQUESTS_CAPTURED_TOTAL: CounterVec = register_counter_vec!(
        "parrot_requests_captured_total",
        "Total number of requests answered by the capture endpoint",
        &["method", "status"]
    )
    .unwrap();

    /// Capture store writes
    pub static ref STORE_WRITES_TOTAL: CounterVec = register_counter_vec!(
        "parrot_store_writes_total",
        "Total number of capture store writes",
        &["result"]  // result: success|error
    )
    .unwrap();

    /// Entries removed by the cleanup sweep
    pub static ref STORE_EVICTIONS_TOTAL: IntCounter = register_int_counter!(
        "parrot_store_evictions_total",
        "Total number of expired store entries removed by the cleanup sweep"
    )
    .unwrap();

    /// Keys held by the store after the last sweep
    pub static ref STORE_KEYS: IntGauge = register_int_gauge!(
        "parrot_store_keys",
        "Number of keys held by the capture store after the last sweep"
    )
    .unwrap();

    /// Slow-drip responses currently streaming
    pub static ref SLOWLORIS_ACTIVE: IntGauge = register_int_gauge!(
        "parrot_slowloris_active",
        "Number of slow-drip responses currently streaming"
    )
    .unwrap();

    /// Slow-drip responses cut short by the client
    pub static ref SLOWLORIS_ABORTED_TOTAL: IntCounter = register_int_counter!(
        "parrot_slowloris_aborted_total",
        "Total number of slow-drip responses aborted because the client went away"
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Methods recorded under their own label; anything else is `OTHER`
const KNOWN_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// Bound the method label, clients may send any extension method
fn method_label(method: &str) -> &'static str {
    KNOWN_METHODS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(method))
        .copied()
        .unwrap_or("OTHER")
}

/// Helper to record a capture response
pub fn record_capture(method: &str, status: u16) {
    REQUESTS_CAPTURED_TOTAL
        .with_label_values(&[method_label(method), &status.to_string()])
        .inc();
}

/// Helper to record a store write
pub fn record_store_write(success: bool) {
    let result = if success { "success" } else { "error" };
    STORE_WRITES_TOTAL.with_label_values(&[result]).inc();
}

/// Helper to record a cleanup sweep
pub fn record_store_sweep(evicted: usize, keys_remaining: usize) {
    STORE_EVICTIONS_TOTAL.inc_by(evicted as u64);
    STORE_KEYS.set(keys_remaining as i64);
}
