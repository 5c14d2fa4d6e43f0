//! Catch-all capture handler.
//!
//! Snapshots the inbound request, files it under its store key (if any), then
//! answers with the snapshot itself using the resolved status and delay.

use crate::api::server::AppState;
use crate::api::types::{error_response, json_response_with_headers, ParrotBody};
use crate::capture::{
    collect_headers, extract_store_key, passthrough_headers, CapturedRequest, StoreError,
};
use crate::decision::ResponseDecision;
use crate::metrics;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use hyper::{Request, Response, StatusCode};
use serde_json::Value;
use std::fmt::Display;
use tracing::{debug, error};

/// Default `Cache-Control` of capture responses, replaceable via `x-parrot-cache-control`
pub const CACHE_CONTROL_VALUE: &str = "max-age=0, must-revalidate";

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to read request body: {0}")]
    BodyRead(String),
    #[error("Request body is not valid JSON: {0}")]
    BodyDecode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CaptureError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CaptureError::BodyRead(_) | CaptureError::BodyDecode(_) | CaptureError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// ANY /* - capture the request and answer with its snapshot
pub async fn handle_capture<B>(req: Request<B>, state: &AppState) -> Response<ParrotBody>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    match capture(req, state).await {
        Ok(response) => response,
        Err(e) => {
            error!("Capture failed: {}", e);
            error_response(e.status_code(), &e.to_string())
        }
    }
}

async fn capture<B>(req: Request<B>, state: &AppState) -> Result<Response<ParrotBody>, CaptureError>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();

    let body_bytes = body
        .collect()
        .await
        .map_err(|e| CaptureError::BodyRead(e.to_string()))?
        .to_bytes();
    let payload = decode_body(&body_bytes)?;

    // Default first so an explicit x-parrot-cache-control can replace it
    let mut response_headers = HeaderMap::new();
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
    response_headers.extend(passthrough_headers(&parts.headers));

    let captured = CapturedRequest::new(
        parts.method.as_str(),
        parts.uri.path(),
        collect_headers(&parts.headers),
        payload,
    );

    if let Some(key) = extract_store_key(&parts.headers, &state.config.store_key_request_headers) {
        let stored = state.store.append(&key, &captured);
        metrics::record_store_write(stored.is_ok());
        stored?;
        debug!("Stored {} {} under key '{}'", captured.method, captured.path, key);
    }

    let decision = ResponseDecision::resolve(&parts.method, parts.uri.query(), &state.config);
    if !decision.delay.is_zero() {
        debug!("Delaying response by {}ms", decision.delay.as_millis());
        tokio::time::sleep(decision.delay).await;
    }

    metrics::record_capture(&captured.method, decision.status.as_u16());
    Ok(json_response_with_headers(
        decision.status,
        response_headers,
        &captured,
    ))
}

/// Decode a non-empty body as JSON; an empty body is no body
fn decode_body(bytes: &[u8]) -> Result<Option<Value>, CaptureError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(bytes)?))
}
