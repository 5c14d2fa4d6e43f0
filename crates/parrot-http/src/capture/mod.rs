//! Request capture: snapshots of inbound requests and the keyed TTL store
//! that holds them.
//!
//! # Module Structure
//!
//! - `types` - Captured request snapshot and store errors
//! - `headers` - Header rendering, store key extraction and passthrough
//! - `store` - Concurrent TTL store with background cleanup

mod headers;
mod store;
mod types;

pub use headers::{
    collect_headers, extract_store_key, passthrough_headers, title_case, PASSTHROUGH_PREFIX,
};
pub use store::CaptureStore;
pub use types::{sort_newest_first, CapturedRequest, StoreError};
