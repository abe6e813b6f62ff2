//! Canonical simulation request types.
//!
//! Everything downstream of the payload normalizer works on these types;
//! no other module inspects raw client JSON.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Declared types that always classify as single-choice.
pub const SINGLE_CHOICE_TYPES: &[&str] = &[
    "multiple-choice",
    "single-choice",
    "single",
    "yes-no",
    "yesno",
    "boolean",
    "scale",
    "rating",
    "likert",
];

/// Declared types that classify as multi-select.
pub const MULTI_SELECT_TYPES: &[&str] = &["multi-select", "checkbox", "multiple-select"];

/// Declared types that receive the canonical yes/no pair when no options are supplied.
pub const YES_NO_TYPES: &[&str] = &["yes-no", "yesno", "boolean"];

/// Canonical options for yes/no questions.
pub const YES_NO_OPTIONS: [&str; 2] = ["Sí", "No"];

/// Respondent bounds for interviews.
pub const INTERVIEW_RESPONDENTS: (u32, u32) = (1, 5);
/// Respondent bounds for professional surveys.
pub const PROFESSIONAL_RESPONDENTS: (u32, u32) = (10, 1000);
/// Respondent bounds for basic surveys (informational only).
pub const BASIC_RESPONDENTS: (u32, u32) = (1, 1000);

/// Default respondent count for surveys.
pub const DEFAULT_SURVEY_RESPONDENTS: u32 = 100;
/// Default respondent count for interviews.
pub const DEFAULT_INTERVIEW_RESPONDENTS: u32 = 3;

/// What kind of instrument is being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationKind {
    /// Closed questions, aggregated to percentages.
    Survey,
    /// Open questions answered in free text.
    Interview,
}

/// Survey depth. Ignored for interviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyMode {
    /// The provider emits percentage distributions directly.
    #[default]
    Basic,
    /// The provider emits individual synthetic respondents, aggregated here.
    Professional,
}

/// The pipeline a request runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    /// Aggregate prompt, provider-side percentages.
    Basic,
    /// Batched persona prompts, local aggregation.
    Professional,
    /// Free-text interview answers.
    Interview,
}

impl SimulationMode {
    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Professional => "professional",
            Self::Interview => "interview",
        }
    }
}

impl std::fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How answers to a question are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Exactly one option per respondent; percentages sum to 100.
    SingleChoice,
    /// Zero or more options per respondent; percentages are independent.
    MultiSelect,
    /// Free text; never aggregated.
    OpenText,
}

impl QuestionKind {
    /// Classify a question from its declared type and whether it has options.
    ///
    /// The single-choice lexicon wins, then the multi-select lexicon, then
    /// any question with options defaults to single-choice.
    ///
    /// ```
    /// use survey_simulator::survey::QuestionKind;
    ///
    /// assert_eq!(QuestionKind::derive("", true), QuestionKind::SingleChoice);
    /// assert_eq!(QuestionKind::derive("multi-select", true), QuestionKind::MultiSelect);
    /// assert_eq!(QuestionKind::derive("text", false), QuestionKind::OpenText);
    /// ```
    #[must_use]
    pub fn derive(declared_type: &str, has_options: bool) -> Self {
        let declared = declared_type.trim().to_lowercase();
        if SINGLE_CHOICE_TYPES.contains(&declared.as_str()) {
            Self::SingleChoice
        } else if MULTI_SELECT_TYPES.contains(&declared.as_str()) {
            Self::MultiSelect
        } else if has_options {
            Self::SingleChoice
        } else {
            Self::OpenText
        }
    }
}

/// A normalized question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier; `q_<n>` when the client omitted one.
    pub id: String,
    /// Text shown to respondents.
    #[serde(rename = "question")]
    pub text: String,
    /// Declared type, lowercased; may be empty.
    #[serde(rename = "type")]
    pub declared_type: String,
    /// Derived counting semantics.
    pub kind: QuestionKind,
    /// Distinct, trimmed, non-empty canonical option texts.
    pub options: Vec<String>,
    /// Informational only.
    pub required: bool,
}

impl Question {
    /// Build a question, deriving its kind from the declared type and options.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        declared_type: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        let declared_type = declared_type.into();
        let kind = QuestionKind::derive(&declared_type, !options.is_empty());
        Self {
            id: id.into(),
            text: text.into(),
            declared_type,
            kind,
            options,
            required: false,
        }
    }

    /// True if the question has options to aggregate over.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.options.is_empty()
    }

    /// The type echoed to clients: the declared type, or the derived kind.
    #[must_use]
    pub fn display_type(&self) -> String {
        if self.declared_type.is_empty() {
            match self.kind {
                QuestionKind::SingleChoice => "multiple-choice".to_string(),
                QuestionKind::MultiSelect => "multi-select".to_string(),
                QuestionKind::OpenText => "open".to_string(),
            }
        } else {
            self.declared_type.clone()
        }
    }
}

/// Free-text context attached to the audience.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceContext {
    /// Description of the audience's situation.
    pub audience_context: String,
    /// Insights supplied by the client.
    pub user_insights: String,
}

/// Target audience description. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    /// Audience name.
    pub name: String,
    /// Audience description.
    pub description: String,
    /// Arbitrary demographic attributes.
    pub demographics: Map<String, Value>,
    /// Arbitrary psychographic attributes.
    pub psychographics: Map<String, Value>,
    /// Additional free-text context.
    pub context: AudienceContext,
}

/// A canonical simulation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// Survey or interview.
    pub kind: SimulationKind,
    /// Survey depth; ignored for interviews.
    pub mode: SurveyMode,
    /// Number of simulated respondents.
    pub respondent_count: u32,
    /// Target audience.
    pub audience: Audience,
    /// Ordered questions.
    pub questions: Vec<Question>,
}

impl SimulationRequest {
    /// The pipeline this request runs through.
    #[must_use]
    pub const fn simulation_mode(&self) -> SimulationMode {
        match (self.kind, self.mode) {
            (SimulationKind::Interview, _) => SimulationMode::Interview,
            (SimulationKind::Survey, SurveyMode::Basic) => SimulationMode::Basic,
            (SimulationKind::Survey, SurveyMode::Professional) => SimulationMode::Professional,
        }
    }

    /// Inclusive respondent bounds for this request's pipeline.
    #[must_use]
    pub const fn respondent_bounds(&self) -> (u32, u32) {
        match self.simulation_mode() {
            SimulationMode::Interview => INTERVIEW_RESPONDENTS,
            SimulationMode::Professional => PROFESSIONAL_RESPONDENTS,
            SimulationMode::Basic => BASIC_RESPONDENTS,
        }
    }

    /// Check the request invariants before any provider call.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyQuestions`] when there are no questions,
    /// [`ValidationError::DuplicateQuestionId`] when two questions share an id,
    /// or [`ValidationError::RespondentCountOutOfRange`] when the count is
    /// outside the bounds for the pipeline.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.questions.is_empty() {
            return Err(ValidationError::EmptyQuestions);
        }
        // Answers, aggregates and rationales are all keyed by question id.
        let mut seen = HashSet::with_capacity(self.questions.len());
        if let Some(repeated) = self.questions.iter().find(|q| !seen.insert(q.id.as_str())) {
            return Err(ValidationError::DuplicateQuestionId {
                id: repeated.id.clone(),
            });
        }
        let (min, max) = self.respondent_bounds();
        if !(min..=max).contains(&self.respondent_count) {
            return Err(ValidationError::RespondentCountOutOfRange {
                count: self.respondent_count,
                min,
                max,
            });
        }
        Ok(())
    }
}
