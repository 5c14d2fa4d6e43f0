//! Response decisions: status code and artificial delay for a captured
//! request.
//!
//! Status code precedence, highest first:
//! 1. `responseCode` query parameter, an integer in `100..=599`
//! 2. First `METHOD:CODE` entry of the method mapping matching the request method
//! 3. The configured default
//!
//! Delay comes only from the `responseDelay` query parameter, in milliseconds,
//! capped at [`MAX_RESPONSE_DELAY`]. Invalid overrides never fail the request,
//! they fall through to the next source.
//!
//! Parameter names match exactly: `response_code` or `RESPONSECODE` are not
//! recognized.

use crate::config::Config;
use hyper::{Method, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

pub const RESPONSE_CODE_PARAM: &str = "responseCode";
pub const RESPONSE_DELAY_PARAM: &str = "responseDelay";

/// Longest delay a request may ask for
pub const MAX_RESPONSE_DELAY: Duration = Duration::from_millis(60_000);

/// Resolved status code and delay for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseDecision {
    pub status: StatusCode,
    pub delay: Duration,
}

impl ResponseDecision {
    pub fn resolve(method: &Method, query: Option<&str>, config: &Config) -> Self {
        Self {
            status: resolve_status(method, query, config),
            delay: resolve_delay(query),
        }
    }
}

/// Get the first value of query parameter `name`, URL-decoded.
///
/// Names are compared after decoding and are case-sensitive. A parameter
/// without `=` has an empty value.
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter(|s| !s.is_empty())
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded_key = urlencoding::decode(key).ok()?;
            if decoded_key != name {
                return None;
            }
            Some(urlencoding::decode(value).ok()?.into_owned())
        })
}

/// Resolve the response status code
pub fn resolve_status(method: &Method, query: Option<&str>, config: &Config) -> StatusCode {
    if let Some(status) = status_from_query(query) {
        return status;
    }

    let default = default_status(config);
    match status_from_method_mapping(method, &config.method_response_code_mapping) {
        Some(Ok(status)) => status,
        Some(Err(raw)) => {
            warn!(
                "Could not parse method response code mapping '{}'. Falling back to response code {}",
                raw,
                default.as_u16()
            );
            default
        }
        None => default,
    }
}

/// Resolve the artificial response delay, zero unless validly requested
pub fn resolve_delay(query: Option<&str>) -> Duration {
    let Some(raw) = query_param(query, RESPONSE_DELAY_PARAM) else {
        return Duration::ZERO;
    };

    match raw.parse::<u64>() {
        Ok(ms) if Duration::from_millis(ms) <= MAX_RESPONSE_DELAY => Duration::from_millis(ms),
        Ok(ms) => {
            debug!(
                "{} query parameter out of range ({}ms), ignoring",
                RESPONSE_DELAY_PARAM, ms
            );
            Duration::ZERO
        }
        Err(e) => {
            debug!(
                "Invalid {} query parameter '{}': {}, ignoring",
                RESPONSE_DELAY_PARAM, raw, e
            );
            Duration::ZERO
        }
    }
}

fn status_from_query(query: Option<&str>) -> Option<StatusCode> {
    let raw = query_param(query, RESPONSE_CODE_PARAM)?;
    let code = match raw.parse::<u16>() {
        Ok(code) => code,
        Err(e) => {
            warn!(
                "Invalid {} query parameter '{}': {}. Falling back to configured mapping/default",
                RESPONSE_CODE_PARAM, raw, e
            );
            return None;
        }
    };

    if !(100..=599).contains(&code) {
        warn!(
            "{} query parameter out of range ({}). Falling back to configured mapping/default",
            RESPONSE_CODE_PARAM, code
        );
        return None;
    }

    StatusCode::from_u16(code).ok()
}

/// Find the first mapping entry for `method`.
///
/// Returns `None` when no entry matches, `Some(Err(entry))` when the
/// matching entry's code is not a valid status code. Entries without exactly
/// one `:` are skipped.
fn status_from_method_mapping<'a>(
    method: &Method,
    mapping: &'a [String],
) -> Option<Result<StatusCode, &'a str>> {
    mapping.iter().find_map(|entry| {
        let (entry_method, code) = entry.split_once(':')?;
        if code.contains(':') {
            return None;
        }
        if !entry_method.trim().eq_ignore_ascii_case(method.as_str()) {
            return None;
        }

        Some(
            code.trim()
                .parse::<u16>()
                .ok()
                .and_then(|c| StatusCode::from_u16(c).ok())
                .ok_or(entry.as_str()),
        )
    })
}

fn default_status(config: &Config) -> StatusCode {
    StatusCode::from_u16(config.response_code).unwrap_or_else(|_| {
        warn!(
            "Configured response code {} is invalid, using 200",
            config.response_code
        );
        StatusCode::OK
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(default: u16, mapping: &[&str]) -> Config {
        Config {
            response_code: default,
            method_response_code_mapping: mapping.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_query_param_first_exact_match() {
        let q = Some("a=1&responseCode=204&responseCode=500");
        assert_eq!(query_param(q, "responseCode"), Some("204".to_string()));
        assert_eq!(query_param(q, "responsecode"), None);
        assert_eq!(query_param(Some("flag&x=%2F"), "flag"), Some(String::new()));
        assert_eq!(query_param(Some("flag&x=%2F"), "x"), Some("/".to_string()));
        assert_eq!(query_param(None, "x"), None);
    }

    #[test]
    fn test_query_overrides_mapping_and_default() {
        let config = config_with(201, &["GET:202", "POST:203"]);
        let status = resolve_status(&Method::GET, Some("responseCode=204"), &config);
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_every_valid_query_code_wins() {
        let config = config_with(201, &["GET:202"]);
        for code in 100..=599u16 {
            let query = format!("responseCode={code}");
            let status = resolve_status(&Method::GET, Some(&query), &config);
            assert_eq!(status.as_u16(), code);
        }
    }

    #[test]
    fn test_invalid_query_code_falls_back_to_mapping() {
        let config = config_with(299, &["GET:202"]);
        for query in [
            "responseCode=700",
            "responseCode=99",
            "responseCode=notanint",
            "responseCode=-200",
            "responseCode=",
            "responseCode=20.5",
        ] {
            let status = resolve_status(&Method::GET, Some(query), &config);
            assert_eq!(status.as_u16(), 202, "query: {query}");
        }
    }

    #[test]
    fn test_invalid_query_code_falls_back_to_default_without_mapping() {
        let config = config_with(299, &[]);
        let status = resolve_status(&Method::GET, Some("responseCode=1000"), &config);
        assert_eq!(status.as_u16(), 299);
    }

    #[test]
    fn test_name_variants_not_recognized() {
        let config = config_with(200, &["GET:202"]);
        let cases = [
            ("response_code=205", 202),
            ("RESPONSECODE=206", 202),
            ("Response-Code=207", 202),
            ("responsecode=208", 202),
            ("responseCode=205", 205),
        ];
        for (query, want) in cases {
            let status = resolve_status(&Method::GET, Some(query), &config);
            assert_eq!(status.as_u16(), want, "query: {query}");
        }
    }

    #[test]
    fn test_mapping_matches_method_case_insensitively() {
        let config = config_with(200, &[" post :201", "get:202"]);
        assert_eq!(resolve_status(&Method::POST, None, &config).as_u16(), 201);
        assert_eq!(resolve_status(&Method::GET, None, &config).as_u16(), 202);
        assert_eq!(resolve_status(&Method::PUT, None, &config).as_u16(), 200);
    }

    #[test]
    fn test_mapping_first_entry_wins() {
        let config = config_with(200, &["GET:202", "GET:203"]);
        assert_eq!(resolve_status(&Method::GET, None, &config).as_u16(), 202);
    }

    #[test]
    fn test_mapping_bad_code_falls_back_to_default() {
        let config = config_with(201, &["GET:abc", "GET:202"]);
        assert_eq!(resolve_status(&Method::GET, None, &config).as_u16(), 201);
    }

    #[test]
    fn test_mapping_malformed_entries_skipped() {
        let config = config_with(200, &["GET", "GET:1:2", "GET:204"]);
        assert_eq!(resolve_status(&Method::GET, None, &config).as_u16(), 204);
    }

    #[test]
    fn test_default_only() {
        let config = config_with(200, &[]);
        assert_eq!(resolve_status(&Method::DELETE, None, &config), StatusCode::OK);
    }

    #[test]
    fn test_delay_valid_values() {
        assert_eq!(
            resolve_delay(Some("responseDelay=500")),
            Duration::from_millis(500)
        );
        assert_eq!(resolve_delay(Some("responseDelay=0")), Duration::ZERO);
        assert_eq!(
            resolve_delay(Some("responseDelay=60000")),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_delay_invalid_values_resolve_to_zero() {
        for query in [
            "",
            "responseDelay=abc",
            "responseDelay=-100",
            "responseDelay=60001",
            "responseDelay=1.5",
            "responsedelay=500",
            "responseDelay=99999999999999999999999",
        ] {
            assert_eq!(resolve_delay(Some(query)), Duration::ZERO, "query: {query}");
        }
        assert_eq!(resolve_delay(None), Duration::ZERO);
    }

    #[test]
    fn test_decision_combines_both() {
        let config = config_with(200, &[]);
        let decision = ResponseDecision::resolve(
            &Method::POST,
            Some("responseCode=418&responseDelay=250"),
            &config,
        );
        assert_eq!(decision.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(decision.delay, Duration::from_millis(250));
    }
}
