//! Parrot: an HTTP request-capture and mock-response server.
//!
//! Every request that does not hit one of the read endpoints is captured,
//! optionally stored under a caller-chosen key and echoed back with a
//! configurable status code and delay. Captured requests can be read back
//! over HTTP until they expire.

pub mod api;
pub mod capture;
pub mod config;
pub mod decision;
pub mod metrics;
pub mod slowloris;
