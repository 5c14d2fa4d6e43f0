//! HTTP API for Parrot.
//!
//! This module serves:
//! - The catch-all capture endpoint (every route not listed below)
//! - `GET /api/v1/requests[/:key]` to read captured requests back
//! - `GET /slowloris` for slow-drip responses
//! - `GET /api/v1/health` and `GET /api/v1/metrics`

mod handlers;
mod router;
mod server;
mod types;

pub use handlers::capture::{handle_capture, CaptureError, CACHE_CONTROL_VALUE};
pub use router::route_request;
pub use server::{AppState, ParrotServer};
pub use types::{error_response, json_response, ParrotBody};
