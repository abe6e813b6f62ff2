//! Error types for the survey simulator.
//!
//! This module defines a hierarchical error system:
//! - [`AppError`]: Top-level application errors
//! - [`ValidationError`]: Malformed or incomplete client requests
//! - [`ProviderError`]: Generation provider failures (transport and run lifecycle)
//! - [`ParseError`]: Provider output that cannot be coerced into JSON or the result contract
//! - [`AggregationError`]: Internal invariant violations in aggregate results
//! - [`ConfigError`]: Configuration errors
//!
//! All errors implement `Send + Sync` for async compatibility.

use thiserror::Error;

/// Top-level application error.
///
/// Every pipeline operation returns this type. The HTTP boundary maps it to
/// a status code with [`AppError::status_code`] and a short, stable,
/// non-leaking label with [`AppError::category`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Client request rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Generation provider failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Provider output could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Aggregate invariant violated.
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// HTTP status code for this error.
    ///
    /// - Validation errors are the caller's fault: `400`.
    /// - Provider output that cannot be coerced into the result contract: `502`.
    /// - Everything else is an internal or provider failure: `500`.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Parse(_) => 502,
            Self::Provider(_) | Self::Aggregation(_) | Self::Config(_) => 500,
        }
    }

    /// Short user-facing error category.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::EmptyQuestions) => "Faltan preguntas.",
            Self::Validation(_) => "Solicitud inválida.",
            Self::Parse(_) => "Respuesta del proveedor inválida.",
            Self::Provider(ProviderError::Timeout { .. }) => "Tiempo de simulación agotado.",
            Self::Provider(_) | Self::Aggregation(_) | Self::Config(_) => {
                "Error interno al simular."
            }
        }
    }

    /// Returns true if this is a parse failure (eligible for a strict-JSON retry).
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// Client request validation errors.
///
/// Always reported to the caller, never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The normalized request has no questions.
    #[error("Request contains no questions")]
    EmptyQuestions,

    /// The request body is not a usable JSON object.
    #[error("Invalid payload: {message}")]
    InvalidPayload {
        /// Description of what's invalid.
        message: String,
    },

    /// Respondent count outside the range allowed for the simulation kind.
    #[error("Respondent count {count} outside [{min}, {max}]")]
    RespondentCountOutOfRange {
        /// The offending count.
        count: u32,
        /// Inclusive lower bound.
        min: u32,
        /// Inclusive upper bound.
        max: u32,
    },

    /// Two questions share an identifier.
    #[error("Duplicate question id: {id}")]
    DuplicateQuestionId {
        /// The repeated identifier.
        id: String,
    },
}

/// Generation provider errors.
///
/// These cover both HTTP-level failures and non-successful run outcomes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Credentials or assistant identifier are not configured.
    #[error("Provider not configured: {var} missing")]
    NotConfigured {
        /// The missing configuration variable.
        var: String,
    },

    /// Authentication failed due to an invalid API key.
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Request was rate limited.
    #[error("Rate limited: retry after {retry_after_seconds}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_seconds: u64,
    },

    /// Network communication error.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// Unexpected response from the provider API.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        /// Description of what was unexpected.
        message: String,
    },

    /// The run did not reach a terminal state before the deadline.
    #[error("Run timeout after {timeout_ms}ms")]
    Timeout {
        /// Deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The run ended in a non-successful terminal state.
    #[error("Run status {status}: {reason}")]
    TerminalFailure {
        /// Terminal status reported by the provider.
        status: String,
        /// Provider-supplied reason, or the status when none was given.
        reason: String,
    },

    /// The run stopped waiting for tool outputs, which this service never supplies.
    #[error("Run {run_id} requires action")]
    RequiresAction {
        /// The run identifier.
        run_id: String,
    },

    /// The completed run produced no assistant text.
    #[error("Assistant returned no text")]
    MissingText,
}

/// Provider output parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No JSON object could be located in the text.
    #[error("No valid JSON found in response: {preview}")]
    NoJson {
        /// Truncated response text.
        preview: String,
    },

    /// A JSON candidate was found but failed to parse.
    #[error("Failed to parse JSON: {message}. Preview: {preview}")]
    InvalidJson {
        /// Parser message.
        message: String,
        /// Truncated response text.
        preview: String,
    },

    /// Valid JSON that does not match the expected structure.
    #[error("Unexpected output shape: {message}")]
    Shape {
        /// Description of the mismatch.
        message: String,
    },

    /// A batch returned fewer respondents than requested.
    #[error("Batch {batch} returned {received} respondents, expected {expected}")]
    IncompleteBatch {
        /// Zero-based batch index.
        batch: usize,
        /// Requested batch size.
        expected: usize,
        /// Number of respondents received.
        received: usize,
    },
}

/// Aggregate invariant violations.
///
/// These indicate a defect in the percentage normalizer, not a runtime condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// A single-choice distribution does not sum to 100.
    #[error("Single-choice distribution for {question_id} sums to {total}")]
    Inconsistent {
        /// The affected question.
        question_id: String,
        /// The observed total.
        total: i64,
    },
}

/// Configuration errors.
///
/// These represent failures in configuration loading and validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required configuration is missing.
    #[error("Missing required: {var}")]
    MissingRequired {
        /// The missing variable name.
        var: String,
    },

    /// Configuration value is invalid.
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue {
        /// The variable name.
        var: String,
        /// Why the value is invalid.
        reason: String,
    },
}
