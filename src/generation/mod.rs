//! Generation client: prompt in, JSON out.
//!
//! One [`GenerationClient::generate`] call walks the run state machine in
//! [`state`]: create a thread, attach the prompt, start a run, then poll the
//! run on a fixed interval until it reaches a terminal status or the
//! caller's deadline passes. Waiting between polls is a `tokio` sleep, so
//! a slow run never blocks other requests.

mod parsing;
mod state;

pub use parsing::{extract_json, extract_text, truncate_for_preview, PREVIEW_CHARS};
pub use state::{transition, RunPhase, RunTransition};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::config::{Config, DEFAULT_POLL_INTERVAL_MS};
use crate::error::{AppError, ProviderError};
use crate::provider::{AssistantsClient, ClientConfig};
use crate::traits::{AssistantBackend, Generator};

/// Drives one generation per call against an [`AssistantBackend`].
#[derive(Debug)]
pub struct GenerationClient<B> {
    backend: B,
    poll_interval: Duration,
}

impl<B: AssistantBackend> GenerationClient<B> {
    /// Create a client with the default poll interval.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Set the interval between run status polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the prompt to completion and return the assistant's reply text.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Timeout`] when the run is still pending after
    /// `timeout`, the run's terminal failure, or [`ProviderError::MissingText`]
    /// when a completed run has no assistant text.
    pub async fn run_to_text(&self, prompt: &str, timeout: Duration) -> Result<String, ProviderError> {
        let start = Instant::now();
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        let mut phase = RunPhase::Created {
            thread_id: self.backend.create_thread().await?,
        };

        loop {
            phase = match phase {
                RunPhase::Created { thread_id } => {
                    self.backend.add_message(&thread_id, prompt).await?;
                    RunPhase::MessageAttached { thread_id }
                }
                RunPhase::MessageAttached { thread_id } => {
                    let run = self.backend.create_run(&thread_id).await?;
                    RunPhase::Running {
                        thread_id,
                        run_id: run.id,
                        status: run.status,
                    }
                }
                RunPhase::Running {
                    thread_id,
                    run_id,
                    status,
                } => {
                    let run = self.backend.retrieve_run(&thread_id, &run_id).await?;
                    tracing::trace!(
                        thread_id = %thread_id,
                        run_id = %run.id,
                        status = %run.status,
                        elapsed_ms = elapsed_ms(start),
                        "Polled run"
                    );
                    let next = RunPhase::Running {
                        thread_id,
                        run_id,
                        status,
                    }
                    .observe(&run)
                    .map_err(|e| {
                        tracing::warn!(run_id = %run.id, error = %e, "Run ended without a result");
                        e
                    })?;
                    if matches!(next, RunPhase::Running { .. }) {
                        self.wait_before_poll(start, timeout, timeout_ms).await?;
                    }
                    next
                }
                RunPhase::Completed { thread_id } => {
                    let messages = self.backend.list_messages(&thread_id).await?;
                    let text = extract_text(&messages).ok_or(ProviderError::MissingText)?;
                    tracing::debug!(
                        thread_id = %thread_id,
                        elapsed_ms = elapsed_ms(start),
                        reply_chars = text.chars().count(),
                        "Run completed"
                    );
                    return Ok(text);
                }
            };
        }
    }
}

impl<B> GenerationClient<B> {
    /// Sleep until the next poll, never past the deadline.
    ///
    /// Fails once the deadline is reached, so the next poll is skipped.
    async fn wait_before_poll(
        &self,
        start: Instant,
        timeout: Duration,
        timeout_ms: u64,
    ) -> Result<(), ProviderError> {
        let remaining = timeout.saturating_sub(start.elapsed());
        if !remaining.is_zero() {
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
            if start.elapsed() < timeout {
                return Ok(());
            }
        }
        tracing::error!(timeout_ms, elapsed_ms = elapsed_ms(start), "Run timed out");
        Err(ProviderError::Timeout { timeout_ms })
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl<B: AssistantBackend> Generator for GenerationClient<B> {
    async fn generate(&self, prompt: String, timeout: Duration) -> Result<Value, AppError> {
        let text = self.run_to_text(&prompt, timeout).await?;
        Ok(extract_json(&text)?)
    }
}

/// Stand-in used when provider credentials are absent.
///
/// Every call fails with [`ProviderError::NotConfigured`] before any network
/// traffic.
#[derive(Debug, Clone)]
pub struct UnconfiguredGenerator {
    missing: String,
}

impl UnconfiguredGenerator {
    /// `missing` names the absent environment variable.
    #[must_use]
    pub fn new(missing: impl Into<String>) -> Self {
        Self {
            missing: missing.into(),
        }
    }
}

#[async_trait]
impl Generator for UnconfiguredGenerator {
    async fn generate(&self, _prompt: String, _timeout: Duration) -> Result<Value, AppError> {
        Err(ProviderError::NotConfigured {
            var: self.missing.clone(),
        }
        .into())
    }
}

/// Build the process-wide generator from configuration.
///
/// Missing credentials are not fatal: the service still starts and reports
/// them through the health probe, and every simulation fails with
/// [`ProviderError::NotConfigured`].
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn generator_from_config(config: &Config) -> Result<Arc<dyn Generator>, ProviderError> {
    let api_key = config.api_key.as_ref().filter(|k| !k.is_blank());
    let (Some(api_key), Some(client_config)) = (api_key, ClientConfig::from_config(config)) else {
        let missing = if api_key.is_none() {
            "OPENAI_API_KEY"
        } else {
            "ASSISTANT_ID"
        };
        tracing::warn!(missing, "Provider credentials missing, simulations will fail");
        return Ok(Arc::new(UnconfiguredGenerator::new(missing)));
    };

    tracing::info!(
        base_url = %client_config.base_url,
        poll_interval_ms = config.poll_interval_ms,
        "Assistants provider configured"
    );
    let client = AssistantsClient::new(api_key.clone(), client_config)?;
    Ok(Arc::new(
        GenerationClient::new(client)
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms)),
    ))
}
