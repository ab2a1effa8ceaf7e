//! Client configuration.
//!
//! Base URL and request timeout for the API client. Values come from the
//! environment (`DEFTER_API_URL`, `DEFTER_TIMEOUT_SECS`) with defaults
//! matching the hosted backend.

use std::time::Duration;

use tracing::warn;

/// Base URL of the hosted backend.
const DEFAULT_API_URL: &str = "https://api.defter.app";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the base URL.
const API_URL_VAR: &str = "DEFTER_API_URL";

/// Environment variable overriding the request timeout, in seconds.
const TIMEOUT_VAR: &str = "DEFTER_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Config for the given base URL with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load config from the environment, falling back to defaults.
    /// Invalid overrides are ignored with a warning rather than failing
    /// startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(API_URL_VAR) {
            if !url.is_empty() {
                config.base_url = url;
            }
        }

        if let Ok(value) = std::env::var(TIMEOUT_VAR) {
            match value.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!(value = %value, "Ignoring invalid request timeout override"),
            }
        }

        config
    }
}
