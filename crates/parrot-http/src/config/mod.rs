//! Configuration for the Parrot server.
//!
//! Settings are resolved once at startup, lowest to highest precedence:
//! built-in defaults, a YAML file, `PARROT_*` environment variables and
//! finally command-line flags. The resulting [`Config`] is immutable for the
//! lifetime of the process and shared behind an `Arc`.

mod env;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use env::ENV_PREFIX;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Listen port
    pub port: u16,

    /// Status code returned when neither the query nor a method mapping decides
    pub response_code: u16,

    /// Ordered `METHOD:CODE` overrides, e.g. `["POST:201", "DELETE:204"]`.
    /// Entries are parsed per request so a bad entry only affects its method.
    pub method_response_code_mapping: Vec<String>,

    /// Header names (case-insensitive) whose value is used as the store key.
    /// Earlier names win when a request carries several of them.
    pub store_key_request_headers: Vec<String>,

    pub slowloris_default_duration_seconds: u64,
    pub slowloris_default_interval_seconds: u64,

    /// Lifetime of a store entry, refreshed on every append
    pub store_ttl_seconds: u64,
    /// Period of the background sweep that drops expired entries
    pub store_cleanup_interval_seconds: u64,

    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_level: String,
}

/// Where the file layer of a loaded [`Config`] came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No config file; defaults plus environment
    Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            response_code: 200,
            method_response_code_mapping: Vec::new(),
            store_key_request_headers: vec!["x-request-key".to_string()],
            slowloris_default_duration_seconds: 30,
            slowloris_default_interval_seconds: 1,
            store_ttl_seconds: 3600,
            store_cleanup_interval_seconds: 600,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the configuration from file and process environment.
    ///
    /// An explicit `path` must exist. Without one, `config.yaml` in the working
    /// directory is used when present and skipped otherwise. The returned
    /// [`ConfigSource`] says which, so the caller can log it once logging is up.
    pub fn load(path: Option<&Path>) -> Result<(Self, ConfigSource), anyhow::Error> {
        let (mut config, source) = match path {
            Some(p) => (Self::from_file(p)?, ConfigSource::File(p.to_path_buf())),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => (
                Self::from_file(DEFAULT_CONFIG_FILE)?,
                ConfigSource::File(PathBuf::from(DEFAULT_CONFIG_FILE)),
            ),
            None => (Self::default(), ConfigSource::Defaults),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok((config, source))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(100..=599).contains(&self.response_code) {
            anyhow::bail!(
                "Invalid responseCode {}: must be between 100 and 599",
                self.response_code
            );
        }

        if self.store_ttl_seconds == 0 {
            anyhow::bail!("storeTtlSeconds must be greater than zero");
        }

        if self.store_cleanup_interval_seconds == 0 {
            anyhow::bail!("storeCleanupIntervalSeconds must be greater than zero");
        }

        if self.slowloris_default_duration_seconds == 0
            || self.slowloris_default_interval_seconds == 0
        {
            anyhow::bail!(
                "slowlorisDefaultDurationSeconds and slowlorisDefaultIntervalSeconds must be greater than zero"
            );
        }

        Ok(())
    }

    pub fn store_ttl(&self) -> Duration {
        Duration::from_secs(self.store_ttl_seconds)
    }

    pub fn store_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.store_cleanup_interval_seconds)
    }

    pub fn slowloris_default_duration(&self) -> Duration {
        Duration::from_secs(self.slowloris_default_duration_seconds)
    }

    pub fn slowloris_default_interval(&self) -> Duration {
        Duration::from_secs(self.slowloris_default_interval_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.response_code, 200);
        assert!(config.method_response_code_mapping.is_empty());
        assert_eq!(config.store_key_request_headers, vec!["x-request-key"]);
        assert_eq!(config.store_ttl(), Duration::from_secs(3600));
        assert_eq!(config.store_cleanup_interval(), Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port: 9090\nresponseCode: 202\nmethodResponseCodeMapping:\n  - \"POST:201\"\n  - \"DELETE:204\""
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.response_code, 202);
        assert_eq!(
            config.method_response_code_mapping,
            vec!["POST:201", "DELETE:204"]
        );
        // Untouched keys fall back to defaults
        assert_eq!(config.store_key_request_headers, vec!["x-request-key"]);
        assert_eq!(config.slowloris_default_interval_seconds, 1);
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_from_file_invalid_yaml_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port: [not, a, port]").unwrap();
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storeTtlSeconds: 5").unwrap();
        let (config, source) = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.store_ttl(), Duration::from_secs(5));
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
    }

    #[test]
    #[serial_test::serial]
    fn test_load_without_file_reports_defaults() {
        // The crate directory carries no config.yaml
        assert!(!Path::new(DEFAULT_CONFIG_FILE).exists());
        let (config, source) = Config::load(None).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_out_of_range_default_code() {
        let config = Config {
            response_code: 600,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("between 100 and 599"));

        let config = Config {
            response_code: 99,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_durations() {
        let config = Config {
            store_ttl_seconds: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            store_cleanup_interval_seconds: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            slowloris_default_interval_seconds: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
