//! Response envelope types.

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateResult, RespondentRecord};
use crate::error::AppError;
use crate::survey::SimulationMode;

/// Provider source tag carried by every success response.
pub const RESPONSE_SOURCE: &str = "assistant";

/// Status echoed when the provider does not supply one.
pub const DEFAULT_STATUS: &str = "completed";

/// One free-text interview answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewAnswer {
    /// Answer text, trimmed and non-empty.
    pub text: String,
}

/// Answers to one interview question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResult {
    /// Question id.
    pub question_id: String,
    /// Question text.
    pub question: String,
    /// At most the requested respondent count.
    pub answers: Vec<InterviewAnswer>,
}

/// Per-mode result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimulationResults {
    /// Percentage distributions (basic and professional surveys).
    Survey(Vec<AggregateResult>),
    /// Free-text answers.
    Interview(Vec<InterviewResult>),
}

impl SimulationResults {
    /// Number of per-question entries.
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Survey(results) => results.len(),
            Self::Interview(results) => results.len(),
        }
    }
}

/// A completed simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    /// Status reported by the provider.
    pub status: String,
    /// Pipeline that produced the results.
    pub mode: SimulationMode,
    /// Per-question results.
    pub results: SimulationResults,
    /// Canonical respondents, professional mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_respondents: Option<Vec<RespondentRecord>>,
}

/// Success envelope returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    /// Always `true`.
    pub success: bool,
    /// Always [`RESPONSE_SOURCE`].
    pub source: String,
    /// `sim_` followed by a UUID.
    pub simulation_id: String,
    /// Status reported by the provider.
    pub status: String,
    /// Pipeline that produced the results.
    pub mode: SimulationMode,
    /// Per-question results.
    pub results: SimulationResults,
    /// Canonical respondents, professional mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_respondents: Option<Vec<RespondentRecord>>,
}

impl SimulationResponse {
    /// Wrap an outcome with a fresh simulation id.
    #[must_use]
    pub fn from_outcome(outcome: SimulationOutcome) -> Self {
        Self {
            success: true,
            source: RESPONSE_SOURCE.to_string(),
            simulation_id: format!("sim_{}", uuid::Uuid::new_v4()),
            status: outcome.status,
            mode: outcome.mode,
            results: outcome.results,
            raw_respondents: outcome.raw_respondents,
        }
    }
}

/// Failure envelope returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Short, stable category.
    pub error: String,
    /// Diagnostic detail.
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            success: false,
            error: err.category().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let response = SimulationResponse::from_outcome(SimulationOutcome {
            status: "completed".to_string(),
            mode: SimulationMode::Interview,
            results: SimulationResults::Interview(vec![InterviewResult {
                question_id: "q1".to_string(),
                question: "¿Qué opinas?".to_string(),
                answers: vec![InterviewAnswer {
                    text: "Me gusta.".to_string(),
                }],
            }]),
            raw_respondents: None,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["source"], "assistant");
        assert_eq!(json["mode"], "interview");
        assert!(json["simulationId"].as_str().unwrap().starts_with("sim_"));
        assert_eq!(
            json["results"],
            json!([{"questionId": "q1", "question": "¿Qué opinas?", "answers": [{"text": "Me gusta."}]}])
        );
        assert!(json.get("rawRespondents").is_none());
    }

    #[test]
    fn test_simulation_ids_are_unique() {
        let outcome = SimulationOutcome {
            status: DEFAULT_STATUS.to_string(),
            mode: SimulationMode::Basic,
            results: SimulationResults::Survey(Vec::new()),
            raw_respondents: None,
        };
        let a = SimulationResponse::from_outcome(outcome.clone());
        let b = SimulationResponse::from_outcome(outcome);
        assert_ne!(a.simulation_id, b.simulation_id);
        assert_eq!(a.results.len(), 0);
    }

    #[test]
    fn test_error_envelope() {
        let err = AppError::from(ValidationError::EmptyQuestions);
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Faltan preguntas.",
                "message": "Validation error: Request contains no questions"
            })
        );
    }
}
