//! Response body type and response helpers for the HTTP API.

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use tracing::error;

/// Body type of every response: buffered JSON/text or a slow-drip stream
pub type ParrotBody = BoxBody<Bytes, Infallible>;

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

/// Individual error detail
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Box a buffered body
pub fn full(body: impl Into<Bytes>) -> ParrotBody {
    Full::new(body.into()).boxed()
}

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<ParrotBody> {
    json_response_with_headers(status, HeaderMap::new(), body)
}

/// Create a JSON response carrying extra headers.
///
/// `Content-Type` is always `application/json`, even if `headers` sets it.
pub fn json_response_with_headers<T: Serialize>(
    status: StatusCode,
    mut headers: HeaderMap,
    body: &T,
) -> Response<ParrotBody> {
    let json = match serde_json::to_string_pretty(body) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            return build_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let mut response = build_response(status, json);
    *response.headers_mut() = headers;
    response
}

/// Build an HTTP response with the given status and body.
///
/// This function handles the unlikely case where Response::builder() fails
/// by returning a minimal 500 error response.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<ParrotBody> {
    Response::builder()
        .status(status)
        .body(full(body))
        .unwrap_or_else(|_| internal_error())
}

/// Build an HTTP response with headers.
///
/// This function handles the unlikely case where Response::builder() fails
/// by returning a minimal 500 error response.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: ParrotBody,
) -> Response<ParrotBody> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder.body(body).unwrap_or_else(|_| internal_error())
}

fn internal_error() -> Response<ParrotBody> {
    let mut response = Response::new(full("Internal Server Error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Create an error response
pub fn error_response(status: StatusCode, message: &str) -> Response<ParrotBody> {
    let error = ErrorResponse {
        errors: vec![ErrorDetail {
            code: status.as_str().to_string(),
            message: message.to_string(),
        }],
    };
    json_response(status, &error)
}

/// Create a not found response
pub fn not_found() -> Response<ParrotBody> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response<ParrotBody>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let resp = error_response(StatusCode::BAD_REQUEST, "Test error");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["errors"][0]["code"], "400");
        assert_eq!(body["errors"][0]["message"], "Test error");
    }

    #[test]
    fn test_json_response() {
        let body = serde_json::json!({"test": "value"});
        let resp = json_response(StatusCode::OK, &body);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_json_response_with_headers_forces_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        headers.insert("location", HeaderValue::from_static("/x"));

        let resp = json_response_with_headers(StatusCode::CREATED, headers, &serde_json::json!([]));
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(resp.headers()["location"], "/x");
    }

    #[test]
    fn test_build_response_with_headers() {
        let resp = build_response_with_headers(
            StatusCode::OK,
            [("Content-Type", "text/plain")],
            full("hello"),
        );
        assert_eq!(resp.headers()["content-type"], "text/plain");
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let resp = not_found();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["errors"][0]["message"], "Not Found");
    }
}
