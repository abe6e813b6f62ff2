//! Assistants API client.
//!
//! This module provides:
//! - HTTP client for the thread/run endpoints
//! - Status-code and transport error mapping
//! - Response decoding

#![allow(clippy::missing_errors_doc)]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::config::ClientConfig;
use super::types::{CreateMessageRequest, CreateRunRequest, MessageList, Run, Thread};
use crate::config::SecretString;
use crate::error::ProviderError;
use crate::traits::AssistantBackend;

/// Beta header required by the Assistants v2 endpoints.
const ASSISTANTS_BETA: &str = "assistants=v2";

/// Number of messages fetched when reading a completed run's reply.
pub const MESSAGE_PAGE_LIMIT: u32 = 10;

/// Assistants API client.
///
/// Holds no per-request state; one instance is shared by every request.
#[derive(Debug)]
pub struct AssistantsClient {
    client: Client,
    api_key: SecretString,
    config: ClientConfig,
}

impl AssistantsClient {
    /// Create a new client.
    pub fn new(api_key: SecretString, config: ClientConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ProviderError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.api_key.expose())
            .header("OpenAI-Beta", ASSISTANTS_BETA)
            .header("content-type", "application/json")
    }

    /// Send a request and decode a successful JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<T, ProviderError> {
        let start = std::time::Instant::now();
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| {
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if e.is_timeout() {
                    tracing::error!(
                        operation,
                        elapsed_ms,
                        timeout_ms = self.config.timeout_ms,
                        "Provider request timed out"
                    );
                    ProviderError::Timeout {
                        timeout_ms: self.config.timeout_ms,
                    }
                } else {
                    tracing::error!(operation, elapsed_ms, error = %e, "Provider request failed");
                    ProviderError::Network {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        tracing::trace!(operation, status = %status, "Provider response received");

        if status.as_u16() == 401 {
            return Err(ProviderError::AuthenticationFailed);
        }

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(ProviderError::RateLimited {
                retry_after_seconds: retry_after,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::UnexpectedResponse {
                message: format!("{operation}: status {status}: {body}"),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::UnexpectedResponse {
                message: format!("{operation}: failed to parse response: {e}"),
            })
    }
}

#[async_trait]
impl AssistantBackend for AssistantsClient {
    async fn create_thread(&self) -> Result<String, ProviderError> {
        let request = self
            .client
            .post(self.url("/threads"))
            .json(&serde_json::json!({}));
        let thread: Thread = self.send(request, "create_thread").await?;
        tracing::debug!(thread_id = %thread.id, "Thread created");
        Ok(thread.id)
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), ProviderError> {
        let request = self
            .client
            .post(self.url(&format!("/threads/{thread_id}/messages")))
            .json(&CreateMessageRequest::user(content));
        let _: serde_json::Value = self.send(request, "add_message").await?;
        tracing::debug!(thread_id, prompt_chars = content.chars().count(), "Message attached");
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<Run, ProviderError> {
        let request = self
            .client
            .post(self.url(&format!("/threads/{thread_id}/runs")))
            .json(&CreateRunRequest {
                assistant_id: self.config.assistant_id.clone(),
            });
        let run: Run = self.send(request, "create_run").await?;
        tracing::debug!(thread_id, run_id = %run.id, status = %run.status, "Run created");
        Ok(run)
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError> {
        let request = self
            .client
            .get(self.url(&format!("/threads/{thread_id}/runs/{run_id}")));
        self.send(request, "retrieve_run").await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<MessageList, ProviderError> {
        let limit = MESSAGE_PAGE_LIMIT.to_string();
        let request = self
            .client
            .get(self.url(&format!("/threads/{thread_id}/messages")))
            .query(&[("order", "desc"), ("limit", limit.as_str())]);
        self.send(request, "list_messages").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::provider::types::{MessageContent, RunStatus};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_mock_client(server: &MockServer) -> AssistantsClient {
        let config = ClientConfig::new("asst_test")
            .with_base_url(server.uri())
            .with_timeout_ms(5_000);
        AssistantsClient::new(SecretString::new("sk-test"), config).unwrap()
    }

    #[test]
    fn test_client_new() {
        let client =
            AssistantsClient::new(SecretString::new("k"), ClientConfig::new("asst_1")).unwrap();
        assert_eq!(client.url("/threads"), "https://api.openai.com/v1/threads");
        assert_eq!(client.config.assistant_id, "asst_1");
    }

    #[test]
    fn test_client_debug_redacts_key() {
        let client =
            AssistantsClient::new(SecretString::new("sk-secret"), ClientConfig::new("a")).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_create_thread_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("openai-beta", ASSISTANTS_BETA))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "thread_1", "object": "thread"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        assert_eq!(client.create_thread().await.unwrap(), "thread_1");
    }

    #[tokio::test]
    async fn test_add_message_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/thread_1/messages"))
            .and(body_json(json!({"role": "user", "content": "hola"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "msg_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        client.add_message("thread_1", "hola").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_run_uses_assistant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/threads/thread_1/runs"))
            .and(body_json(json!({"assistant_id": "asst_test"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "run_1", "status": "queued"})),
            )
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        let run = client.create_run("thread_1").await.unwrap();
        assert_eq!(run.id, "run_1");
        assert_eq!(run.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn test_retrieve_run_failed_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/runs/run_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "run_1",
                "status": "failed",
                "last_error": {"code": "rate_limit_exceeded", "message": "quota"}
            })))
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        let run = client.retrieve_run("thread_1", "run_1").await.unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.failure_reason(), "quota");
    }

    #[tokio::test]
    async fn test_list_messages_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/threads/thread_1/messages"))
            .and(query_param("order", "desc"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"role": "assistant", "content": [{"type": "text", "text": {"value": "{}"}}]}]
            })))
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        let list = client.list_messages("thread_1").await.unwrap();
        assert_eq!(list.data[0].content[0], MessageContent::text("{}"));
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": {}})))
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        assert_eq!(
            client.create_thread().await,
            Err(ProviderError::AuthenticationFailed)
        );
    }

    #[tokio::test]
    async fn test_rate_limited_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        assert_eq!(
            client.create_thread().await,
            Err(ProviderError::RateLimited {
                retry_after_seconds: 17
            })
        );
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        let err = client.create_thread().await.unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedResponse { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = create_mock_client(&server);
        let err = client.create_thread().await.unwrap_err();
        assert!(err.to_string().contains("failed to parse response"));
    }

    #[tokio::test]
    async fn test_http_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "t"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = ClientConfig::new("a")
            .with_base_url(server.uri())
            .with_timeout_ms(50);
        let client = AssistantsClient::new(SecretString::new("k"), config).unwrap();
        assert_eq!(
            client.create_thread().await,
            Err(ProviderError::Timeout { timeout_ms: 50 })
        );
    }
}
