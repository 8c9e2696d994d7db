//! Startup configuration
//!
//! Resolved once from the environment before anything else starts.

use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_LOG_FILE: &str = "stock-chat.log";

const BACKEND_URL_VAR: &str = "STOCK_CHAT_BACKEND_URL";
const PROBE_INTERVAL_VAR: &str = "STOCK_CHAT_PROBE_INTERVAL_SECS";
const LOG_FILE_VAR: &str = "STOCK_CHAT_LOG_FILE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid URL ({value:?}): {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("{var} must use http or https, got {scheme:?}")]
    UnsupportedScheme { var: &'static str, scheme: String },
    #[error("{var} must be a positive whole number of seconds, got {value:?}")]
    InvalidInterval { var: &'static str, value: String },
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash
    pub backend_url: String,
    pub probe_interval: Duration,
    pub log_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            probe_interval: Duration::from_secs(DEFAULT_PROBE_INTERVAL_SECS),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables
    /// fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let backend_url = match get(BACKEND_URL_VAR) {
            Some(raw) => parse_backend_url(raw.trim())?,
            None => defaults.backend_url,
        };

        let probe_interval = match get(PROBE_INTERVAL_VAR) {
            Some(raw) => parse_interval(raw.trim())?,
            None => defaults.probe_interval,
        };

        let log_file = get(LOG_FILE_VAR).map_or(defaults.log_file, PathBuf::from);

        Ok(Self {
            backend_url,
            probe_interval,
            log_file,
        })
    }
}

fn parse_backend_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        var: BACKEND_URL_VAR,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(ConfigError::UnsupportedScheme {
            var: BACKEND_URL_VAR,
            scheme: other.to_string(),
        }),
    }
}

fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidInterval {
            var: PROBE_INTERVAL_VAR,
            value: raw.to_string(),
        }),
    }
}
