//! Trait definitions for mockable dependencies.
//!
//! This module defines traits for:
//! - [`AssistantBackend`]: the provider's thread/run primitives
//! - [`Generator`]: submit a prompt, receive parsed JSON
//!
//! # Mocking
//!
//! Both traits are annotated with `#[cfg_attr(test, mockall::automock)]`
//! which generates mock implementations automatically for testing.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, ProviderError};
use crate::provider::{MessageList, Run};

/// Assistant provider primitives.
///
/// One generation is a thread with a single user message and a single run
/// against the configured assistant. Implementations are stateless and
/// shared across concurrent requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Create an empty thread and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the API call fails.
    async fn create_thread(&self) -> Result<String, ProviderError>;

    /// Attach a user message to a thread.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the API call fails.
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), ProviderError>;

    /// Start a run of the configured assistant on a thread.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the API call fails.
    async fn create_run(&self, thread_id: &str) -> Result<Run, ProviderError>;

    /// Fetch the current state of a run.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the API call fails.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError>;

    /// List a thread's most recent messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the API call fails.
    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, ProviderError>;
}

/// Prompt in, JSON out.
///
/// The seam between the simulation pipelines and the provider. The pipelines
/// never see threads or runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Submit `prompt` and wait at most `timeout` for a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Provider`] on provider failure or timeout and
    /// [`AppError::Parse`] when the reply holds no usable JSON.
    async fn generate(&self, prompt: String, timeout: Duration) -> Result<Value, AppError>;
}
