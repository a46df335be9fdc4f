//! Client configuration.
//!
//! Every client is built from a [`ClientConfig`]: the API key, where the API
//! lives, and how long to wait for it. Defaults match the hosted service.

use std::env;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::DEFAULT_TIMEOUT;
use crate::job::{DEFAULT_MAX_PINGS, DEFAULT_PING_INTERVAL};

/// Base URL of the hosted API.
pub const DEFAULT_BASE_URL: &str = "https://selectpdf.com/api2/";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "SELECTPDF_API_KEY";

/// Environment variable overriding [`DEFAULT_BASE_URL`].
pub const ENV_BASE_URL: &str = "SELECTPDF_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    /// Root of the API; operation paths (`convert/`, `asyncjob/`, ...) are
    /// appended to it.
    pub base_url: String,
    /// Upper bound for one HTTP request. Default: 600 s.
    pub timeout: Duration,
    /// Pause before each async status check. Default: 3 s.
    pub ping_interval: Duration,
    /// Status checks allowed before an async call times out. Default: 1000.
    pub max_pings: u32,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            max_pings: DEFAULT_MAX_PINGS,
        }
    }

    /// Read the key from `SELECTPDF_API_KEY` and, if set, the base URL from
    /// `SELECTPDF_API_BASE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        let api_key = env::var(ENV_API_KEY)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ApiError::Validation(format!("{ENV_API_KEY} is not set")))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    pub fn with_max_pings(mut self, max_pings: u32) -> Self {
        self.max_pings = max_pings;
        self
    }

    /// Full URL of an operation endpoint, e.g. `endpoint("convert")`.
    pub fn endpoint(&self, operation: &str) -> String {
        format!("{}/{operation}/", self.base_url.trim_end_matches('/'))
    }
}
