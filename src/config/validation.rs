//! Configuration validation.
//!
//! This module provides validation logic for configuration values,
//! ensuring they are within acceptable ranges.

use super::Config;
use crate::error::ConfigError;

/// Minimum allowed timeout in milliseconds (1 second).
pub const MIN_TIMEOUT_MS: u64 = 1_000;

/// Maximum allowed timeout in milliseconds (10 minutes).
pub const MAX_TIMEOUT_MS: u64 = 600_000;

/// Minimum allowed polling interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Maximum allowed polling interval.
pub const MAX_POLL_INTERVAL_MS: u64 = 10_000;

/// Maximum allowed professional batch size.
pub const MAX_BATCH_SIZE: u32 = 500;

/// Validate configuration values.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if any value is out of range:
/// - every deadline must be between 1s and 10m
/// - `POLL_INTERVAL_MS` must be between 100 and 10000
/// - `BATCH_SIZE` must be between 1 and 500
/// - `PORT` must not be 0
/// - `OPENAI_BASE_URL` must be an http(s) URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (var, value) in [
        ("HTTP_TIMEOUT_MS", config.http_timeout_ms),
        ("BASIC_TIMEOUT_MS", config.basic_timeout_ms),
        ("INTERVIEW_TIMEOUT_MS", config.interview_timeout_ms),
        ("RATIONALE_TIMEOUT_MS", config.rationale_timeout_ms),
        ("BATCH_BASE_TIMEOUT_MS", config.batch.base_timeout_ms),
    ] {
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&value) {
            return Err(ConfigError::InvalidValue {
                var: var.into(),
                reason: format!("must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} ms"),
            });
        }
    }

    if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&config.poll_interval_ms) {
        return Err(ConfigError::InvalidValue {
            var: "POLL_INTERVAL_MS".into(),
            reason: format!(
                "must be between {MIN_POLL_INTERVAL_MS} and {MAX_POLL_INTERVAL_MS} ms"
            ),
        });
    }

    if config.batch.size == 0 || config.batch.size > MAX_BATCH_SIZE {
        return Err(ConfigError::InvalidValue {
            var: "BATCH_SIZE".into(),
            reason: format!("must be between 1 and {MAX_BATCH_SIZE}"),
        });
    }

    if config.port == 0 {
        return Err(ConfigError::InvalidValue {
            var: "PORT".into(),
            reason: "must not be 0".into(),
        });
    }

    if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            var: "OPENAI_BASE_URL".into(),
            reason: "must start with http:// or https://".into(),
        });
    }

    Ok(())
}
