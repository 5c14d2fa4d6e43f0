//! Environment variable overrides.
//!
//! Every config key can be overridden by `PARROT_` followed by the key in
//! upper case without separators (`responseCode` -> `PARROT_RESPONSECODE`).
//! List values are comma separated.

use super::Config;
use anyhow::Context;
use std::str::FromStr;

pub const ENV_PREFIX: &str = "PARROT_";

impl Config {
    /// Apply overrides found through `lookup`, which maps a variable name to
    /// its value. Taking a lookup function keeps this testable without
    /// touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

        if let Some(v) = var("PORT") {
            self.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = var("RESPONSECODE") {
            self.response_code = parse_var("RESPONSECODE", &v)?;
        }
        if let Some(v) = var("METHODRESPONSECODEMAPPING") {
            self.method_response_code_mapping = split_list(&v);
        }
        if let Some(v) = var("STOREKEYREQUESTHEADERS") {
            self.store_key_request_headers = split_list(&v);
        }
        if let Some(v) = var("SLOWLORISDEFAULTDURATIONSECONDS") {
            self.slowloris_default_duration_seconds =
                parse_var("SLOWLORISDEFAULTDURATIONSECONDS", &v)?;
        }
        if let Some(v) = var("SLOWLORISDEFAULTINTERVALSECONDS") {
            self.slowloris_default_interval_seconds =
                parse_var("SLOWLORISDEFAULTINTERVALSECONDS", &v)?;
        }
        if let Some(v) = var("STORETTLSECONDS") {
            self.store_ttl_seconds = parse_var("STORETTLSECONDS", &v)?;
        }
        if let Some(v) = var("STORECLEANUPINTERVALSECONDS") {
            self.store_cleanup_interval_seconds = parse_var("STORECLEANUPINTERVALSECONDS", &v)?;
        }
        if let Some(v) = var("LOGLEVEL") {
            self.log_level = v;
        }

        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value '{value}' for {ENV_PREFIX}{key}"))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
