//! Configuration management.
//!
//! This module handles:
//! - Environment variable loading (with `.env` support)
//! - Configuration validation
//! - Default value handling
//! - Secure API key storage via [`SecretString`]
//!
//! Provider credentials are optional at startup. The health probe reports
//! whether they are present, and a simulation attempted without them fails
//! before any network traffic.
//!
//! # Example
//!
//! ```
//! use survey_simulator::config::{Config, SecretString};
//!
//! let config = Config {
//!     api_key: Some(SecretString::new("sk-proj-example")),
//!     assistant_id: Some("asst_123".to_string()),
//!     ..Config::default()
//! };
//!
//! assert!(config.has_credentials());
//! let debug = format!("{config:?}");
//! assert!(debug.contains("<REDACTED>"));
//! assert!(!debug.contains("sk-proj-example"));
//! ```

mod secret;
mod validation;

pub use secret::SecretString;
pub use validation::{
    validate_config, MAX_BATCH_SIZE, MAX_POLL_INTERVAL_MS, MAX_TIMEOUT_MS, MIN_POLL_INTERVAL_MS,
    MIN_TIMEOUT_MS,
};

use crate::error::ConfigError;

/// Default provider base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default listen host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 10_000;
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default timeout for a single HTTP call to the provider.
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
/// Default run polling interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 900;
/// Default deadline for the aggregate (basic survey) prompt.
pub const DEFAULT_BASIC_TIMEOUT_MS: u64 = 90_000;
/// Default deadline for the interview prompt.
pub const DEFAULT_INTERVIEW_TIMEOUT_MS: u64 = 90_000;
/// Default deadline for the rationale prompt.
pub const DEFAULT_RATIONALE_TIMEOUT_MS: u64 = 60_000;
/// Default professional batch size.
pub const DEFAULT_BATCH_SIZE: u32 = 100;
/// Default per-batch base deadline.
pub const DEFAULT_BATCH_BASE_TIMEOUT_MS: u64 = 60_000;
/// Default per-batch deadline allowance per respondent.
pub const DEFAULT_BATCH_PER_RESPONDENT_MS: u64 = 600;
/// Default per-batch deadline allowance per question.
pub const DEFAULT_BATCH_PER_QUESTION_MS: u64 = 2_000;
/// Default request body limit (4 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Front-end origins allowed by default.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://naluinsights.lovable.app",
    "https://preview-naluinsights.lovable.app",
    "https://nalua.com",
    "https://www.nalua.com",
    "https://naluia.com",
    "https://www.naluia.com",
];

/// Batch sizing and per-batch deadline parameters for professional surveys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Maximum respondents per provider call.
    pub size: u32,
    /// Base deadline for every batch.
    pub base_timeout_ms: u64,
    /// Additional deadline per respondent in the batch.
    pub per_respondent_ms: u64,
    /// Additional deadline per question.
    pub per_question_ms: u64,
}

impl BatchSettings {
    /// Deadline for one batch of `batch_size` respondents over `question_count` questions.
    ///
    /// ```
    /// use survey_simulator::config::BatchSettings;
    ///
    /// let settings = BatchSettings::default();
    /// assert_eq!(settings.timeout_ms(100, 5), 60_000 + 100 * 600 + 5 * 2_000);
    /// ```
    #[must_use]
    pub const fn timeout_ms(&self, batch_size: usize, question_count: usize) -> u64 {
        self.base_timeout_ms
            .saturating_add((batch_size as u64).saturating_mul(self.per_respondent_ms))
            .saturating_add((question_count as u64).saturating_mul(self.per_question_ms))
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_BATCH_SIZE,
            base_timeout_ms: DEFAULT_BATCH_BASE_TIMEOUT_MS,
            per_respondent_ms: DEFAULT_BATCH_PER_RESPONDENT_MS,
            per_question_ms: DEFAULT_BATCH_PER_QUESTION_MS,
        }
    }
}

/// Application configuration.
///
/// Use [`Config::from_env`] to load configuration from environment variables.
/// Read-only after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Provider API key (protected from logging via [`SecretString`]).
    pub api_key: Option<SecretString>,
    /// Provider assistant identifier.
    pub assistant_id: Option<String>,
    /// Provider base URL.
    pub base_url: String,
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Log level (error, warn, info, debug, trace) or a full filter directive.
    pub log_level: String,
    /// Timeout for a single HTTP call to the provider.
    pub http_timeout_ms: u64,
    /// Interval between run status polls.
    pub poll_interval_ms: u64,
    /// Deadline for the aggregate prompt.
    pub basic_timeout_ms: u64,
    /// Deadline for the interview prompt.
    pub interview_timeout_ms: u64,
    /// Deadline for the rationale prompt.
    pub rationale_timeout_ms: u64,
    /// Professional batch parameters.
    pub batch: BatchSettings,
    /// Whether professional surveys request per-question rationales.
    pub rationales_enabled: bool,
    /// CORS allow-list.
    pub allowed_origins: Vec<String>,
    /// Request body limit in bytes.
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables (with defaults):
    /// - `OPENAI_API_KEY`, `ASSISTANT_ID`: provider credentials (none)
    /// - `OPENAI_BASE_URL`: provider base URL (`https://api.openai.com/v1`)
    /// - `HOST`, `PORT`: listen address (`0.0.0.0:10000`)
    /// - `LOG_LEVEL`: logging filter (`info`)
    /// - `HTTP_TIMEOUT_MS`, `POLL_INTERVAL_MS`: provider call tuning
    /// - `BASIC_TIMEOUT_MS`, `INTERVIEW_TIMEOUT_MS`, `RATIONALE_TIMEOUT_MS`: prompt deadlines
    /// - `BATCH_SIZE`, `BATCH_BASE_TIMEOUT_MS`, `BATCH_PER_RESPONDENT_MS`,
    ///   `BATCH_PER_QUESTION_MS`: professional batching
    /// - `RATIONALES_ENABLED`: `true`/`false`
    /// - `ALLOWED_ORIGINS`: comma-separated CORS allow-list
    /// - `MAX_BODY_BYTES`: request body limit
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric or boolean value cannot be parsed
    /// or fails validation (see [`validate_config`]).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let api_key = non_empty_env("OPENAI_API_KEY").map(SecretString::new);
        let assistant_id = non_empty_env("ASSISTANT_ID");
        let base_url = non_empty_env("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let host = non_empty_env("HOST").unwrap_or_else(|| DEFAULT_HOST.into());
        let log_level = non_empty_env("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.into());

        let port = u16::try_from(parse_env_u64("PORT", u64::from(DEFAULT_PORT))?).map_err(|_| {
            ConfigError::InvalidValue {
                var: "PORT".into(),
                reason: "must fit in 16 bits".into(),
            }
        })?;

        let batch = BatchSettings {
            size: u32::try_from(parse_env_u64("BATCH_SIZE", u64::from(DEFAULT_BATCH_SIZE))?)
                .map_err(|_| ConfigError::InvalidValue {
                    var: "BATCH_SIZE".into(),
                    reason: "too large".into(),
                })?,
            base_timeout_ms: parse_env_u64("BATCH_BASE_TIMEOUT_MS", DEFAULT_BATCH_BASE_TIMEOUT_MS)?,
            per_respondent_ms: parse_env_u64(
                "BATCH_PER_RESPONDENT_MS",
                DEFAULT_BATCH_PER_RESPONDENT_MS,
            )?,
            per_question_ms: parse_env_u64("BATCH_PER_QUESTION_MS", DEFAULT_BATCH_PER_QUESTION_MS)?,
        };

        let allowed_origins = non_empty_env("ALLOWED_ORIGINS").map_or_else(
            default_allowed_origins,
            |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            },
        );

        let max_body_bytes = usize::try_from(parse_env_u64(
            "MAX_BODY_BYTES",
            DEFAULT_MAX_BODY_BYTES as u64,
        )?)
        .map_err(|_| ConfigError::InvalidValue {
            var: "MAX_BODY_BYTES".into(),
            reason: "too large".into(),
        })?;

        let config = Self {
            api_key,
            assistant_id,
            base_url,
            host,
            port,
            log_level,
            http_timeout_ms: parse_env_u64("HTTP_TIMEOUT_MS", DEFAULT_HTTP_TIMEOUT_MS)?,
            poll_interval_ms: parse_env_u64("POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            basic_timeout_ms: parse_env_u64("BASIC_TIMEOUT_MS", DEFAULT_BASIC_TIMEOUT_MS)?,
            interview_timeout_ms: parse_env_u64(
                "INTERVIEW_TIMEOUT_MS",
                DEFAULT_INTERVIEW_TIMEOUT_MS,
            )?,
            rationale_timeout_ms: parse_env_u64(
                "RATIONALE_TIMEOUT_MS",
                DEFAULT_RATIONALE_TIMEOUT_MS,
            )?,
            batch,
            rationales_enabled: parse_env_bool("RATIONALES_ENABLED", true)?,
            allowed_origins,
            max_body_bytes,
        };

        validate_config(&config)?;
        Ok(config)
    }

    /// True when both the API key and the assistant identifier are present.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_blank()) && self.assistant_id.is_some()
    }

    /// The `host:port` pair to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            basic_timeout_ms: DEFAULT_BASIC_TIMEOUT_MS,
            interview_timeout_ms: DEFAULT_INTERVIEW_TIMEOUT_MS,
            rationale_timeout_ms: DEFAULT_RATIONALE_TIMEOUT_MS,
            batch: BatchSettings::default(),
            rationales_enabled: true,
            allowed_origins: default_allowed_origins(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS
        .iter()
        .map(|o| (*o).to_string())
        .collect()
}

/// Read an environment variable, treating blank values as unset.
fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable as u64, using a default if not set.
fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    non_empty_env(name).map_or(Ok(default), |val| {
        val.parse().map_err(|_| ConfigError::InvalidValue {
            var: name.into(),
            reason: "must be a positive integer".into(),
        })
    })
}

/// Parse an environment variable as a boolean flag, using a default if not set.
fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    non_empty_env(name).map_or(Ok(default), |val| {
        match val.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                var: name.into(),
                reason: "must be true or false".into(),
            }),
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    const VARS: &[&str] = &[
        "OPENAI_API_KEY",
        "ASSISTANT_ID",
        "OPENAI_BASE_URL",
        "HOST",
        "PORT",
        "LOG_LEVEL",
        "HTTP_TIMEOUT_MS",
        "POLL_INTERVAL_MS",
        "BASIC_TIMEOUT_MS",
        "INTERVIEW_TIMEOUT_MS",
        "RATIONALE_TIMEOUT_MS",
        "BATCH_SIZE",
        "BATCH_BASE_TIMEOUT_MS",
        "BATCH_PER_RESPONDENT_MS",
        "BATCH_PER_QUESTION_MS",
        "RATIONALES_ENABLED",
        "ALLOWED_ORIGINS",
        "MAX_BODY_BYTES",
    ];

    /// Helper to set up a clean test environment.
    fn setup_test_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        setup_test_env();

        let config = Config::from_env().expect("should load config");

        assert!(config.api_key.is_none());
        assert!(config.assistant_id.is_none());
        assert!(!config.has_credentials());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.batch, BatchSettings::default());
        assert!(config.rationales_enabled);
        assert_eq!(config.allowed_origins.len(), DEFAULT_ALLOWED_ORIGINS.len());
    }

    #[test]
    #[serial]
    fn test_config_from_env_with_all_vars() {
        setup_test_env();

        env::set_var("OPENAI_API_KEY", "sk-proj-test");
        env::set_var("ASSISTANT_ID", "asst_abc");
        env::set_var("OPENAI_BASE_URL", "http://localhost:9999/v1");
        env::set_var("PORT", "8080");
        env::set_var("POLL_INTERVAL_MS", "500");
        env::set_var("BATCH_SIZE", "50");
        env::set_var("RATIONALES_ENABLED", "false");
        env::set_var("ALLOWED_ORIGINS", "https://a.example, https://b.example ,");

        let config = Config::from_env().expect("should load config");

        assert_eq!(config.api_key.as_ref().unwrap().expose(), "sk-proj-test");
        assert_eq!(config.assistant_id.as_deref(), Some("asst_abc"));
        assert!(config.has_credentials());
        assert_eq!(config.base_url, "http://localhost:9999/v1");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.batch.size, 50);
        assert!(!config.rationales_enabled);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );

        setup_test_env();
    }

    #[test]
    #[serial]
    fn test_config_blank_key_is_unset() {
        setup_test_env();
        env::set_var("OPENAI_API_KEY", "   ");

        let config = Config::from_env().expect("should load config");
        assert!(config.api_key.is_none());

        setup_test_env();
    }

    #[test]
    #[serial]
    fn test_config_invalid_number() {
        setup_test_env();
        env::set_var("BATCH_SIZE", "lots");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "BATCH_SIZE"));

        setup_test_env();
    }

    #[test]
    #[serial]
    fn test_config_invalid_bool() {
        setup_test_env();
        env::set_var("RATIONALES_ENABLED", "maybe");

        let err = Config::from_env().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { var, .. } if var == "RATIONALES_ENABLED")
        );

        setup_test_env();
    }

    #[test]
    #[serial]
    fn test_config_port_out_of_range() {
        setup_test_env();
        env::set_var("PORT", "70000");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "PORT"));

        setup_test_env();
    }

    #[test]
    fn test_batch_timeout_scales() {
        let settings = BatchSettings {
            size: 100,
            base_timeout_ms: 1_000,
            per_respondent_ms: 10,
            per_question_ms: 100,
        };
        assert_eq!(settings.timeout_ms(0, 0), 1_000);
        assert_eq!(settings.timeout_ms(50, 3), 1_000 + 500 + 300);
        assert!(settings.timeout_ms(100, 3) > settings.timeout_ms(50, 3));
    }

    #[test]
    fn test_has_credentials_requires_both() {
        let only_key = Config {
            api_key: Some(SecretString::new("k")),
            ..Config::default()
        };
        assert!(!only_key.has_credentials());

        let only_assistant = Config {
            assistant_id: Some("asst".to_string()),
            ..Config::default()
        };
        assert!(!only_assistant.has_credentials());
    }
}
