//! Header handling for captured requests.

use hyper::header::{
    HeaderMap, HeaderName, CONNECTION, CONTENT_LENGTH, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
};
use std::collections::BTreeMap;

/// Inbound headers starting with this prefix are echoed back as response
/// headers with the prefix removed (`x-parrot-location` -> `location`).
pub const PASSTHROUGH_PREFIX: &str = "x-parrot-";

/// Framing and hop-by-hop headers hyper owns on the response; never passed through
const RESERVED_HEADERS: [HeaderName; 6] =
    [CONTENT_LENGTH, TRANSFER_ENCODING, CONNECTION, TE, TRAILER, UPGRADE];

fn is_reserved(name: &HeaderName) -> bool {
    RESERVED_HEADERS.contains(name) || name == "keep-alive" || name == "proxy-connection"
}

/// Convert a lowercase header name to title case
/// (e.g., "content-type" -> "Content-Type")
pub fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}

/// Render a header map as title-cased names to all of their values.
///
/// Values that are not valid UTF-8 are kept lossily rather than dropped.
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers.iter() {
        let value = match value.to_str() {
            Ok(v) => v.to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
        };
        out.entry(title_case(name.as_str())).or_default().push(value);
    }
    out
}

/// Find the store key for a request.
///
/// The allow-list is walked in configured order and the first listed header
/// that is present decides; its first value is the key. Empty or non-UTF-8
/// values mean "do not store".
pub fn extract_store_key(headers: &HeaderMap, allow_list: &[String]) -> Option<String> {
    allow_list
        .iter()
        .find_map(|candidate| {
            let name =
                HeaderName::from_bytes(candidate.trim().to_ascii_lowercase().as_bytes()).ok()?;
            let value = headers.get(&name)?;
            // Present ends the search, usable or not
            Some(
                value
                    .to_str()
                    .ok()
                    .filter(|v| !v.is_empty())
                    .map(str::to_string),
            )
        })
        .flatten()
}

/// Build the outbound headers requested through `x-parrot-*` headers.
///
/// When a name repeats, the last value in header-map order wins. Framing and
/// hop-by-hop names (`content-length`, `transfer-encoding`, `connection`, ...)
/// are dropped, hyper computes those for the echoed body.
pub fn passthrough_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers.iter() {
        let Some(stripped) = name.as_str().strip_prefix(PASSTHROUGH_PREFIX) else {
            continue;
        };
        match HeaderName::from_bytes(stripped.as_bytes()) {
            Ok(target) if !is_reserved(&target) => {
                out.insert(target, value.clone());
            }
            _ => {}
        }
    }
    out
}
