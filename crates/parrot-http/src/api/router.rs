//! Route dispatch logic.
//!
//! A handful of `GET` routes are served by the API; every other request,
//! whatever its method or path, is captured.

use crate::api::handlers::{capture, requests, slowloris, system};
use crate::api::server::AppState;
use crate::api::types::ParrotBody;
use bytes::Bytes;
use hyper::body::Body;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::fmt::Display;
use std::time::Instant;
use tracing::{debug, info};

const REQUESTS_PATH: &str = "/api/v1/requests";

/// Parsed route
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    /// GET /api/v1/requests
    ListRequests,
    /// GET /api/v1/requests/:key (key still percent-encoded)
    RequestsByKey(&'a str),
    /// GET /api/v1/health
    Health,
    /// GET /api/v1/metrics
    Metrics,
    /// GET /slowloris
    Slowloris,
    /// Anything else
    Capture,
}

impl<'a> Route<'a> {
    fn parse(method: &Method, path: &'a str) -> Self {
        if method != Method::GET {
            return Route::Capture;
        }

        match path {
            REQUESTS_PATH => Route::ListRequests,
            "/api/v1/health" => Route::Health,
            "/api/v1/metrics" => Route::Metrics,
            "/slowloris" => Route::Slowloris,
            _ => match path
                .strip_prefix(REQUESTS_PATH)
                .and_then(|rest| rest.strip_prefix('/'))
            {
                Some(key) if !key.is_empty() && !key.contains('/') => Route::RequestsByKey(key),
                _ => Route::Capture,
            },
        }
    }
}

/// Main request router
pub async fn route_request<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<ParrotBody>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());

    let route = Route::parse(&method, &path);
    debug!("{} {} routed to {:?}", method, path, route);

    let response = match route {
        Route::ListRequests => requests::handle_list(&state),
        Route::RequestsByKey(key) => requests::handle_get(key, &state),
        Route::Health => system::handle_health(),
        Route::Metrics => system::handle_metrics(),
        Route::Slowloris => slowloris::handle_slowloris(query.as_deref(), &state),
        Route::Capture => capture::handle_capture(req, &state).await,
    };

    info!(
        "{} {} -> {} ({}ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_parse() {
        assert_eq!(
            Route::parse(&Method::GET, "/api/v1/requests"),
            Route::ListRequests
        );
        assert_eq!(
            Route::parse(&Method::GET, "/api/v1/requests/test-key"),
            Route::RequestsByKey("test-key")
        );
        assert_eq!(Route::parse(&Method::GET, "/api/v1/health"), Route::Health);
        assert_eq!(Route::parse(&Method::GET, "/api/v1/metrics"), Route::Metrics);
        assert_eq!(Route::parse(&Method::GET, "/slowloris"), Route::Slowloris);
    }

    #[test]
    fn test_route_parse_falls_back_to_capture() {
        assert_eq!(Route::parse(&Method::GET, "/"), Route::Capture);
        assert_eq!(Route::parse(&Method::GET, "/test"), Route::Capture);
        assert_eq!(Route::parse(&Method::GET, "/api/v1/requests/"), Route::Capture);
        assert_eq!(Route::parse(&Method::GET, "/api/v1/requests/a/b"), Route::Capture);
        assert_eq!(Route::parse(&Method::GET, "/api/v1/requestsx"), Route::Capture);
        assert_eq!(Route::parse(&Method::GET, "/slowloris/x"), Route::Capture);
    }

    #[test]
    fn test_route_parse_non_get_is_captured() {
        assert_eq!(Route::parse(&Method::POST, "/api/v1/requests"), Route::Capture);
        assert_eq!(Route::parse(&Method::DELETE, "/api/v1/requests/k"), Route::Capture);
        assert_eq!(Route::parse(&Method::PUT, "/slowloris"), Route::Capture);
    }
}
