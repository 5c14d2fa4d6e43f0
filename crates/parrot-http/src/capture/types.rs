//! Captured request snapshot and store errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Immutable snapshot of one inbound request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedRequest {
    pub time: DateTime<Utc>,
    pub path: String,
    pub method: String,
    /// Title-cased header name to every value received for it, in arrival order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
    /// Decoded JSON payload, `None` when the request had no body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl CapturedRequest {
    /// Snapshot a request as of now
    pub fn new(
        method: &str,
        path: &str,
        headers: BTreeMap<String, Vec<String>>,
        body: Option<Value>,
    ) -> Self {
        Self {
            time: Utc::now(),
            path: path.to_string(),
            method: method.to_ascii_uppercase(),
            headers,
            // A literal `null` body is indistinguishable from no body on the wire
            body: body.filter(|b| !b.is_null()),
        }
    }
}

/// Sort captured requests by capture time, most recent first.
///
/// The sort is stable so requests captured within the same instant keep
/// their insertion order.
pub fn sort_newest_first(requests: &mut [CapturedRequest]) {
    requests.sort_by(|a, b| b.time.cmp(&a.time));
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to encode captured request: {0}")]
    Encode(serde_json::Error),
    #[error("Failed to decode stored request: {0}")]
    Decode(serde_json::Error),
}
