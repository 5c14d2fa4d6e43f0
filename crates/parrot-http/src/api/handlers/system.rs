//! System handlers: health, metrics.

use crate::api::types::{build_response_with_headers, full, json_response, ParrotBody};
use crate::metrics::collect_metrics;
use hyper::{Response, StatusCode};

/// GET /api/v1/health - Health check
pub fn handle_health() -> Response<ParrotBody> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /api/v1/metrics - Prometheus metrics
pub fn handle_metrics() -> Response<ParrotBody> {
    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        full(collect_metrics()),
    )
}
