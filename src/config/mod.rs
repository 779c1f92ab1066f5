//! Runtime configuration from command-line flags and environment variables.
//!
//! Every flag has a `USERBOX_*` environment fallback and a default, so the
//! binary runs with no arguments at all.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::router::RouterOptions;
use crate::store::{BASELINE, DEFAULT_CAPACITY};

/// Errors found while validating a [`Config`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("capacity {capacity} is smaller than the {baseline}-entry baseline")]
    CapacityBelowBaseline { capacity: usize, baseline: usize },

    #[error("max request size must be at least 1 byte")]
    ZeroRequestLimit,

    #[error("read timeout must be at least 1 ms")]
    ZeroReadTimeout,
}

/// userbox service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "userbox", version, about = "In-memory users list over HTTP", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "USERBOX_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Maximum number of stored users, baseline included
    #[arg(long, env = "USERBOX_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Largest request, headers and body together, the server will buffer
    #[arg(long, env = "USERBOX_MAX_REQUEST_BYTES", default_value_t = 4096)]
    pub max_request_bytes: usize,

    /// How long to wait for a complete request before giving up
    #[arg(long, env = "USERBOX_READ_TIMEOUT_MS", default_value_t = 5000)]
    pub read_timeout_ms: u64,

    /// Answer `/all` with 409 unless five users exist
    #[arg(long, env = "USERBOX_STRICT_ALL", default_value_t = false)]
    pub strict_all: bool,
}

impl Config {
    /// Checks values clap cannot express as types.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity < BASELINE.len() {
            return Err(ConfigError::CapacityBelowBaseline {
                capacity: self.capacity,
                baseline: BASELINE.len(),
            });
        }
        if self.max_request_bytes == 0 {
            return Err(ConfigError::ZeroRequestLimit);
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::ZeroReadTimeout);
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            strict_all: self.strict_all,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_owned(),
            capacity: DEFAULT_CAPACITY,
            max_request_bytes: 4096,
            read_timeout_ms: 5000,
            strict_all: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let config = Config::try_parse_from(["userbox"]).unwrap();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.max_request_bytes, 4096);
        assert_eq!(config.read_timeout(), Duration::from_millis(5000));
        assert!(!config.strict_all);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "userbox",
            "--bind",
            "127.0.0.1:9000",
            "--capacity",
            "10",
            "--read-timeout-ms",
            "250",
            "--strict-all",
        ])
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.capacity, 10);
        assert_eq!(config.read_timeout_ms, 250);
        assert_eq!(config.router_options(), RouterOptions { strict_all: true });
    }

    #[test]
    fn rejects_capacity_below_baseline() {
        let config = Config {
            capacity: 1,
            ..Config::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::CapacityBelowBaseline {
                capacity: 1,
                baseline: 2
            }
        );
    }

    #[test]
    fn rejects_zero_limits() {
        let config = Config {
            max_request_bytes: 0,
            ..Config::default()
        };
        assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroRequestLimit);

        let config = Config {
            read_timeout_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.validate().unwrap_err(), ConfigError::ZeroReadTimeout);
    }

    #[test]
    fn non_numeric_capacity_is_a_parse_error() {
        assert!(Config::try_parse_from(["userbox", "--capacity", "lots"]).is_err());
    }
}
