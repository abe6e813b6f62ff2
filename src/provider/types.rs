//! Assistants API request and response types.
//!
//! Only the fields this service reads are modelled; everything else the
//! provider sends is ignored.

#![allow(clippy::missing_const_for_fn)]

use serde::{Deserialize, Serialize};

/// Body of `POST /threads/{thread}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateMessageRequest {
    /// Always `user`.
    pub role: String,
    /// Prompt text.
    pub content: String,
}

impl CreateMessageRequest {
    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /threads/{thread}/runs`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest {
    /// Assistant to run.
    pub assistant_id: String,
}

/// A created thread.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Thread {
    /// Thread identifier.
    pub id: String,
}

/// Run lifecycle status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start.
    Queued,
    /// Executing.
    InProgress,
    /// Cancellation requested but not finished.
    Cancelling,
    /// Finished successfully.
    Completed,
    /// Waiting for tool outputs.
    RequiresAction,
    /// Finished with an error.
    Failed,
    /// Cancelled.
    Cancelled,
    /// Expired before finishing.
    Expired,
    /// Finished without a complete answer.
    Incomplete,
    /// Any status this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Cancelling => "cancelling",
            Self::Completed => "completed",
            Self::RequiresAction => "requires_action",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details attached to a failed run.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RunError {
    /// Provider error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Human readable message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A run of an assistant on a thread.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Run {
    /// Run identifier.
    pub id: String,
    /// Current status.
    pub status: RunStatus,
    /// Set when the run failed.
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    /// Create a run with the given status.
    #[must_use]
    pub fn new(id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            status,
            last_error: None,
        }
    }

    /// Attach a failure message.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(RunError {
            code: None,
            message: Some(message.into()),
        });
        self
    }

    /// The provider's failure message, or the status name when none was given.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        self.last_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map_or_else(|| self.status.as_str().to_string(), str::to_string)
    }
}

/// Text payload of a content part.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextValue {
    /// The text.
    #[serde(default)]
    pub value: String,
}

/// One content part of a thread message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Plain text.
    Text {
        /// Text payload.
        text: TextValue,
    },
    /// Images, file references and anything else.
    #[serde(other)]
    Other,
}

impl MessageContent {
    /// A text part.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            text: TextValue {
                value: value.into(),
            },
        }
    }
}

/// A message on a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadMessage {
    /// `user` or `assistant`.
    pub role: String,
    /// Content parts in order.
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// An assistant message with one text part.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: vec![MessageContent::text(text)],
        }
    }

    /// A user message with one text part.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![MessageContent::text(text)],
        }
    }
}

/// Response of `GET /threads/{thread}/messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageList {
    /// Messages in the requested order.
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
}

impl MessageList {
    /// Wrap messages, newest first.
    #[must_use]
    pub fn new(data: Vec<ThreadMessage>) -> Self {
        Self { data }
    }
}
