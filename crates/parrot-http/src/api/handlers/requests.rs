//! Read path for captured requests.

use crate::api::server::AppState;
use crate::api::types::{error_response, json_response, not_found, ParrotBody};
use crate::capture::{sort_newest_first, CapturedRequest, StoreError};
use hyper::{Response, StatusCode};
use tracing::error;

/// GET /api/v1/requests - every live captured request, newest first
pub fn handle_list(state: &AppState) -> Response<ParrotBody> {
    match state.store.all() {
        Ok(entries) => {
            let mut requests: Vec<CapturedRequest> = entries.into_iter().flatten().collect();
            sort_newest_first(&mut requests);
            json_response(StatusCode::OK, &requests)
        }
        Err(e) => store_failure(e),
    }
}

/// GET /api/v1/requests/:key - captured requests under one store key
pub fn handle_get(raw_key: &str, state: &AppState) -> Response<ParrotBody> {
    let key = match urlencoding::decode(raw_key) {
        Ok(key) => key,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid store key encoding"),
    };

    match state.store.get(&key) {
        Ok(Some(mut requests)) => {
            sort_newest_first(&mut requests);
            json_response(StatusCode::OK, &requests)
        }
        Ok(None) => not_found(),
        Err(e) => store_failure(e),
    }
}

fn store_failure(e: StoreError) -> Response<ParrotBody> {
    error!("Failed to read captured requests: {}", e);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
}
