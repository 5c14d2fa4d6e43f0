//! Request handlers, one module per concern.

pub mod capture;
pub mod requests;
pub mod slowloris;
pub mod system;
