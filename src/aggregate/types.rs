//! Aggregate and respondent result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::survey::{Question, QuestionKind};

/// One option's share of a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionShare {
    /// Canonical option text.
    pub text: String,
    /// Integer percentage in `[0, 100]`.
    pub percentage: u32,
}

impl OptionShare {
    /// Create a share.
    #[must_use]
    pub fn new(text: impl Into<String>, percentage: u32) -> Self {
        Self {
            text: text.into(),
            percentage,
        }
    }
}

/// One simulated respondent with canonicalized answers.
///
/// `answers` maps question ids to selected canonical option texts. A
/// single-choice entry always holds exactly one option; a multi-select entry
/// may be empty. Questions whose answer was invalid have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondentRecord {
    /// `r` followed by a zero-padded sequence number, unique per run.
    pub respondent_id: String,
    /// Selected options per question id.
    pub answers: BTreeMap<String, Vec<String>>,
}

impl RespondentRecord {
    /// Create a record with no answers.
    #[must_use]
    pub fn new(respondent_id: impl Into<String>) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            answers: BTreeMap::new(),
        }
    }

    /// Add an answer.
    #[must_use]
    pub fn with_answer(mut self, question_id: impl Into<String>, selected: Vec<String>) -> Self {
        self.answers.insert(question_id.into(), selected);
        self
    }
}

/// Format a 1-based respondent sequence number as an id.
///
/// ```
/// use survey_simulator::aggregate::respondent_id;
///
/// assert_eq!(respondent_id(1), "r0001");
/// assert_eq!(respondent_id(250), "r0250");
/// assert_eq!(respondent_id(12345), "r12345");
/// ```
#[must_use]
pub fn respondent_id(sequence: usize) -> String {
    format!("r{sequence:04}")
}

/// Final per-question result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Question id.
    pub question_id: String,
    /// Question text.
    pub question: String,
    /// Declared (or derived) question type.
    #[serde(rename = "type")]
    pub question_type: String,
    /// Counting semantics.
    pub kind: QuestionKind,
    /// Declared options, echoed.
    pub options: Vec<String>,
    /// Percentages in option order. Empty for open questions.
    pub aggregates: Vec<OptionShare>,
    /// Short justification, attached after aggregation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl AggregateResult {
    /// A result for `question` with the given distribution and no rationale.
    #[must_use]
    pub fn for_question(question: &Question, aggregates: Vec<OptionShare>) -> Self {
        Self {
            question_id: question.id.clone(),
            question: question.text.clone(),
            question_type: question.display_type(),
            kind: question.kind,
            options: question.options.clone(),
            aggregates,
            rationale: None,
        }
    }

    /// Attach a rationale; blank text is ignored.
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        let rationale = rationale.into();
        let trimmed = rationale.trim();
        if !trimmed.is_empty() {
            self.rationale = Some(trimmed.to_string());
        }
        self
    }
}
