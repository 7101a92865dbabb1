//! Client configuration: base URL, default page size, debug flag, timeout.

use std::time::Duration;

/// Environment variable holding the API base URL.
pub const BASE_URL_VAR: &str = "RESTMAP_BASE_URL";
/// Environment variable holding the default page size for list calls.
pub const PAGE_SIZE_VAR: &str = "RESTMAP_PAGE_SIZE";
/// Environment variable enabling verbose request/response logging.
pub const DEBUG_VAR: &str = "RESTMAP_DEBUG";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_VAR: &str = "RESTMAP_TIMEOUT_SECS";

const DEFAULT_PAGE_SIZE: u64 = 20;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),
}

/// Read-only settings handed to [`crate::Client`] at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// `limit` used by list calls that do not set one.
    pub page_size: u64,
    /// Log every request and response at `info` level.
    pub debug: bool,
    /// Timeout applied by [`crate::HttpTransport`].
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Loads the configuration from `RESTMAP_*` environment variables.
    ///
    /// Only the base URL is required; unparsable optional values fall back to
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            std::env::var(BASE_URL_VAR).map_err(|_| ConfigError::MissingVar(BASE_URL_VAR))?;
        Ok(Self::new(&base_url)
            .with_page_size(env_u64(PAGE_SIZE_VAR, DEFAULT_PAGE_SIZE))
            .with_debug(env_flag(DEBUG_VAR))
            .with_timeout(Duration::from_secs(env_u64(
                TIMEOUT_VAR,
                DEFAULT_TIMEOUT.as_secs(),
            ))))
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
