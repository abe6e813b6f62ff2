//! Prompt templates.
//!
//! Pure functions from a [`SimulationRequest`] (plus mode-specific context)
//! to prompt text. Every prompt ends with the exact JSON shape the
//! simulation parsers expect, so the two sides must change together.
//!
//! - [`aggregate_prompt`]: basic surveys, provider-side percentages
//! - [`persona_batch_prompt`]: professional surveys, one batch of respondents
//! - [`interview_prompt`]: free-text interview answers
//! - [`rationale_prompt`]: justifications for computed distributions
//! - [`strict_json_retry_prompt`]: re-ask after unparsable output
//!
//! Prompts are written in Spanish, the language of the option texts they
//! must reproduce verbatim.
//!
//! # Example
//!
//! ```
//! use survey_simulator::prompts::strict_json_retry_prompt;
//!
//! let prompt = strict_json_retry_prompt("Genera 10 personas.");
//! assert!(prompt.contains("JSON"));
//! assert!(prompt.ends_with("Genera 10 personas."));
//! ```

mod interview;
mod survey;

pub use interview::interview_prompt;
pub use survey::{aggregate_prompt, persona_batch_prompt, rationale_prompt};

use serde_json::{json, Value};

use crate::survey::{Question, SimulationRequest};

/// Prefix a prompt with an instruction to answer with strict JSON only.
#[must_use]
pub fn strict_json_retry_prompt(original: &str) -> String {
    [
        "Tu respuesta anterior NO era JSON válido y no pudo procesarse.",
        "Repite la tarea y responde ÚNICAMENTE con un objeto JSON válido:",
        "sin bloques de código, sin comentarios, sin texto antes ni después.",
        "",
        original,
    ]
    .join("\n")
}

/// Audience block shared by every prompt.
fn audience_line(request: &SimulationRequest) -> String {
    let audience = serde_json::to_string(&request.audience).unwrap_or_else(|_| "{}".to_string());
    format!("Público: {audience}")
}

/// The questions as the provider should see them.
fn questions_line(questions: &[Question]) -> String {
    let items: Vec<Value> = questions
        .iter()
        .map(|q| {
            json!({
                "questionId": q.id,
                "question": q.text,
                "type": q.display_type(),
                "options": q.options,
            })
        })
        .collect();
    format!("Preguntas: {}", Value::Array(items))
}
