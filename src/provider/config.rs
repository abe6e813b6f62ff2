//! Assistants client configuration.

use crate::config::{Config, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT_MS};

/// Client configuration for the Assistants API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL for the API, without a trailing slash.
    pub base_url: String,
    /// Per-request HTTP timeout in milliseconds.
    pub timeout_ms: u64,
    /// Assistant every run is started against.
    pub assistant_id: String,
}

impl ClientConfig {
    /// Create a configuration for `assistant_id` with default URL and timeout.
    #[must_use]
    pub fn new(assistant_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            assistant_id: assistant_id.into(),
        }
    }

    /// Derive from the service configuration. `None` when no assistant is configured.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        let assistant_id = config.assistant_id.as_deref()?;
        Some(
            Self::new(assistant_id)
                .with_base_url(&config.base_url)
                .with_timeout_ms(config.http_timeout_ms),
        )
    }

    /// Set base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set timeout in milliseconds.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}
