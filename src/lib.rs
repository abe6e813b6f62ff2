//! Survey Simulator
//!
//! An HTTP service that synthesizes survey and interview responses for a
//! described target audience through an assistant-style LLM provider.
//!
//! # Features
//!
//! - Three pipelines: basic surveys, professional surveys, interviews
//! - Professional surveys generate individual respondents in batches and
//!   aggregate them locally with exact percentage guarantees
//! - Tolerant parsing of provider output, with one strict-JSON retry per batch
//! - One normalization boundary for historical client payload shapes
//!
//! # Quick Start
//!
//! ```bash
//! OPENAI_API_KEY=sk-proj-xxx ASSISTANT_ID=asst_xxx ./survey-simulator
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  POST /simulations/run  ┌──────────────────┐  threads/runs  ┌──────────────┐
//! │ Frontend │────────────────────────▶│ Survey Simulator │───────────────▶│  Assistants  │
//! │          │◀────────────────────────│      (Rust)      │◀───────────────│     API      │
//! └──────────┘     percentages/text    └──────────────────┘  polled reply  └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod error;
pub mod generation;
pub mod metrics;
pub mod prompts;
pub mod provider;
pub mod server;
pub mod simulation;
pub mod survey;
pub mod traits;
