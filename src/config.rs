//! Client configuration: API base URL and optional request timeout.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const API_BASE_ENV: &str = "SEALCALC_API_BASE";
pub const TIMEOUT_ENV: &str = "SEALCALC_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid API base URL {0:?}: must start with http:// or https://")]
    InvalidBaseUrl(String),

    #[error("Invalid timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClientConfig")]
pub struct ClientConfig {
    /// Empty means "same host", matching a relative deployment.
    #[serde(default)]
    pub base_url: String,
    /// `None` waits indefinitely.
    #[serde(default, with = "optional_secs")]
    pub request_timeout: Option<Duration>,
}

/// Wire form of [`ClientConfig`], normalized on the way in.
#[derive(Deserialize)]
struct RawClientConfig {
    #[serde(default)]
    base_url: String,
    #[serde(default, with = "optional_secs")]
    request_timeout: Option<Duration>,
}

impl TryFrom<RawClientConfig> for ClientConfig {
    type Error = ConfigError;

    fn try_from(raw: RawClientConfig) -> Result<Self, Self::Error> {
        if raw.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTimeout("0".to_string()));
        }
        Ok(Self {
            base_url: normalize_base(&raw.base_url)?,
            request_timeout: raw.request_timeout,
        })
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base(&base_url.into())?,
            request_timeout: None,
        })
    }

    /// Reads `SEALCALC_API_BASE` and `SEALCALC_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = env::var(API_BASE_ENV).unwrap_or_default();
        let timeout = env::var(TIMEOUT_ENV).ok();
        Self::from_values(&base, timeout.as_deref())
    }

    pub fn from_values(base: &str, timeout_secs: Option<&str>) -> Result<Self, ConfigError> {
        let request_timeout = timeout_secs
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_timeout)
            .transpose()?;
        Ok(Self {
            base_url: normalize_base(base)?,
            request_timeout,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Join an endpoint path (leading slash included) onto the base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn normalize_base(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

mod optional_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}
