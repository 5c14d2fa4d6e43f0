//! GET /slowloris handler.

use crate::api::server::AppState;
use crate::api::types::{build_response_with_headers, ParrotBody};
use crate::slowloris::{spawn_drip, DripParams};
use http_body_util::BodyExt;
use hyper::{Response, StatusCode};
use tracing::debug;

/// GET /slowloris - stream `.` bytes slowly
pub fn handle_slowloris(query: Option<&str>, state: &AppState) -> Response<ParrotBody> {
    let params = DripParams::resolve(query, &state.config);
    debug!(
        "Starting slow-drip: duration {:?}, interval {:?}",
        params.duration, params.interval
    );

    build_response_with_headers(
        StatusCode::OK,
        [("Content-Type", "text/plain")],
        spawn_drip(params).boxed(),
    )
}
