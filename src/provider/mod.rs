//! Assistants provider client.
//!
//! This module provides:
//! - [`AssistantsClient`]: reqwest client for the thread/run endpoints
//! - Wire types for threads, runs and messages
//!
//! The client is a thin transport. Polling, deadlines and reply parsing
//! live in [`crate::generation`].

mod client;
mod config;
mod types;

pub use client::{AssistantsClient, MESSAGE_PAGE_LIMIT};
pub use config::ClientConfig;
pub use types::{
    CreateMessageRequest, CreateRunRequest, MessageContent, MessageList, Run, RunError, RunStatus,
    TextValue, Thread, ThreadMessage,
};
