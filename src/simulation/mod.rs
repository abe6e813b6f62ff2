//! Simulation pipelines.
//!
//! [`Simulator::run`] validates a canonical request and dispatches on its
//! [`SimulationMode`]:
//!
//! - **Basic**: one aggregate prompt; provider percentages are mapped back
//!   onto the declared options and normalized.
//! - **Professional**: batched persona prompts, local aggregation, then an
//!   optional best-effort rationale call.
//! - **Interview**: one interview prompt; free-text answers are trimmed and
//!   capped.
//!
//! Validation happens before any provider call. A provider or parse failure
//! in a mandatory call aborts the whole simulation.

mod output;
mod types;

pub use output::{
    parse_basic_results, parse_interview_results, parse_rationales, parse_respondents,
    provider_status,
};
pub use types::{
    ErrorResponse, InterviewAnswer, InterviewResult, SimulationOutcome, SimulationResponse,
    SimulationResults, DEFAULT_STATUS, RESPONSE_SOURCE,
};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::aggregate::{aggregate, validate_results, AggregateResult};
use crate::batch::BatchOrchestrator;
use crate::config::{BatchSettings, Config};
use crate::error::AppError;
use crate::prompts::{aggregate_prompt, interview_prompt, rationale_prompt};
use crate::survey::{normalize_payload, SimulationMode, SimulationRequest, INTERVIEW_RESPONDENTS};
use crate::traits::Generator;

/// Deadlines and switches for the pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Deadline for the aggregate prompt.
    pub basic_timeout: Duration,
    /// Deadline for the interview prompt.
    pub interview_timeout: Duration,
    /// Deadline for the rationale prompt.
    pub rationale_timeout: Duration,
    /// Professional batching.
    pub batch: BatchSettings,
    /// Whether professional surveys request rationales.
    pub rationales_enabled: bool,
}

impl SimulationSettings {
    /// Take the pipeline settings from the service configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            basic_timeout: Duration::from_millis(config.basic_timeout_ms),
            interview_timeout: Duration::from_millis(config.interview_timeout_ms),
            rationale_timeout: Duration::from_millis(config.rationale_timeout_ms),
            batch: config.batch,
            rationales_enabled: config.rationales_enabled,
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Runs simulations against a shared [`Generator`].
#[derive(Debug)]
pub struct Simulator<G: ?Sized> {
    generator: Arc<G>,
    settings: SimulationSettings,
}

impl<G: ?Sized> Clone for Simulator<G> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            settings: self.settings,
        }
    }
}

impl<G: Generator + ?Sized> Simulator<G> {
    /// Create a simulator.
    #[must_use]
    pub const fn new(generator: Arc<G>, settings: SimulationSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// The active settings.
    #[must_use]
    pub const fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Normalize a raw client payload and run it.
    ///
    /// # Errors
    ///
    /// See [`Simulator::run`]; payload problems surface as validation errors.
    pub async fn run_payload(&self, body: &Value) -> Result<SimulationOutcome, AppError> {
        let request = normalize_payload(body)?;
        self.run(&request).await
    }

    /// Run one simulation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] before any provider call when the
    /// request is invalid, otherwise the first provider, parse or
    /// aggregation failure.
    pub async fn run(&self, request: &SimulationRequest) -> Result<SimulationOutcome, AppError> {
        request.validate()?;

        let mode = request.simulation_mode();
        tracing::info!(
            mode = %mode,
            questions = request.questions.len(),
            respondents = request.respondent_count,
            "Running simulation"
        );

        match mode {
            SimulationMode::Basic => self.run_basic(request).await,
            SimulationMode::Professional => self.run_professional(request).await,
            SimulationMode::Interview => self.run_interview(request).await,
        }
    }

    async fn run_basic(&self, request: &SimulationRequest) -> Result<SimulationOutcome, AppError> {
        let reply = self
            .generator
            .generate(aggregate_prompt(request), self.settings.basic_timeout)
            .await?;
        let results = parse_basic_results(&reply, &request.questions)?;
        validate_results(&results)?;

        Ok(SimulationOutcome {
            status: provider_status(&reply),
            mode: SimulationMode::Basic,
            results: SimulationResults::Survey(results),
            raw_respondents: None,
        })
    }

    async fn run_professional(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationOutcome, AppError> {
        let respondents = BatchOrchestrator::new(self.generator.as_ref(), self.settings.batch)
            .run(request)
            .await?;

        let mut results = aggregate(&request.questions, &respondents);
        validate_results(&results)?;

        if self.settings.rationales_enabled {
            results = self.attach_rationales(request, results).await;
        }

        Ok(SimulationOutcome {
            status: DEFAULT_STATUS.to_string(),
            mode: SimulationMode::Professional,
            results: SimulationResults::Survey(results),
            raw_respondents: Some(respondents),
        })
    }

    /// Best-effort: on any failure the results are returned without rationales.
    async fn attach_rationales(
        &self,
        request: &SimulationRequest,
        results: Vec<AggregateResult>,
    ) -> Vec<AggregateResult> {
        if results.iter().all(|r| r.aggregates.is_empty()) {
            return results;
        }

        let prompt = rationale_prompt(request, &results);
        match self
            .generator
            .generate(prompt, self.settings.rationale_timeout)
            .await
        {
            Ok(reply) => {
                let rationales = parse_rationales(&reply);
                results
                    .into_iter()
                    .map(|result| match rationales.get(&result.question_id) {
                        Some(text) => result.with_rationale(text.as_str()),
                        None => result,
                    })
                    .collect()
            }
            Err(err) => {
                tracing::warn!(error = %err, "Rationale generation failed, returning results without rationales");
                results
            }
        }
    }

    async fn run_interview(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationOutcome, AppError> {
        let reply = self
            .generator
            .generate(interview_prompt(request), self.settings.interview_timeout)
            .await?;
        let max_answers = request
            .respondent_count
            .clamp(INTERVIEW_RESPONDENTS.0, INTERVIEW_RESPONDENTS.1);
        let results = parse_interview_results(
            &reply,
            &request.questions,
            usize::try_from(max_answers).unwrap_or(usize::MAX),
        )?;

        Ok(SimulationOutcome {
            status: provider_status(&reply),
            mode: SimulationMode::Interview,
            results: SimulationResults::Interview(results),
            raw_respondents: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::aggregate::{total_percentage, OptionShare};
    use crate::error::{ParseError, ProviderError, ValidationError};
    use crate::traits::MockGenerator;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn simulator(generator: MockGenerator) -> Simulator<MockGenerator> {
        Simulator::new(Arc::new(generator), SimulationSettings::default())
    }

    fn survey_payload(survey_type: &str, count: u32) -> Value {
        json!({
            "form_data": {
                "questions": [
                    {"id": "q1", "question": "¿Comprarías?", "type": "yes-no"},
                    {"id": "q2", "question": "¿Dónde?", "type": "checkbox", "options": ["Online", "Tienda"]}
                ]
            },
            "audience_data": {"name": "Madres", "surveyType": survey_type, "responseCount": count}
        })
    }

    #[tokio::test]
    async fn test_empty_questions_rejected_before_provider_call() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().never();
        let err = simulator(generator)
            .run_payload(&json!({"questions": []}))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Validation(ValidationError::EmptyQuestions));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_repeated_question_id_rejected_before_provider_call() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().never();
        let err = simulator(generator)
            .run_payload(&json!({
                "questions": [
                    {"id": "q1", "question": "¿Comprarías?", "options": ["Sí", "No"]},
                    {"id": "q1", "question": "¿Dónde?", "options": ["Online", "Tienda"]}
                ],
                "audience": {"surveyType": "professional", "responseCount": 10}
            }))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::DuplicateQuestionId { .. })
        ));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_basic_pipeline() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt, timeout| {
                prompt.contains("\"aggregates\"") && *timeout == Duration::from_millis(90_000)
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "status": "completed",
                    "results": [
                        {"questionId": "q1", "aggregates": [{"text": "sí", "percentage": 55}, {"text": "no", "percentage": 55}]},
                        {"questionId": "q2", "aggregates": [{"text": "Online", "percentage": 70}, {"text": "Tienda", "percentage": 60}]}
                    ]
                }))
            });

        let outcome = simulator(generator)
            .run_payload(&survey_payload("basic", 100))
            .await
            .unwrap();
        assert_eq!(outcome.mode, SimulationMode::Basic);
        assert_eq!(outcome.status, "completed");
        assert!(outcome.raw_respondents.is_none());
        let SimulationResults::Survey(results) = outcome.results else {
            panic!("expected survey results");
        };
        assert_eq!(
            results[0].aggregates,
            vec![OptionShare::new("Sí", 50), OptionShare::new("No", 50)]
        );
        assert_eq!(total_percentage(&results[1].aggregates), 130);
    }

    #[tokio::test]
    async fn test_basic_pipeline_unparsable_is_502() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, _| Ok(json!({"status": "completed"})));

        let err = simulator(generator)
            .run_payload(&survey_payload("basic", 100))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(ParseError::Shape { .. })));
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_professional_pipeline_with_rationales() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt, _| prompt.contains("raw_respondents"))
            .times(1)
            .returning(|_, _| {
                let raw: Vec<Value> = (0..10)
                    .map(|i| {
                        json!({"answers": [
                            {"questionId": "q1", "choice": if i < 6 { "Sí" } else { "No" }},
                            {"questionId": "q2", "choices": if i < 3 { vec!["Online", "Tienda"] } else { vec!["Online"] }}
                        ]})
                    })
                    .collect();
                Ok(json!({"raw_respondents": raw}))
            });
        generator
            .expect_generate()
            .withf(|prompt, _| prompt.contains("\"rationales\""))
            .times(1)
            .returning(|_, _| {
                Ok(json!({"rationales": [{"questionId": "q1", "rationale": "Confían en la marca."}]}))
            });

        let outcome = simulator(generator)
            .run_payload(&survey_payload("professional", 10))
            .await
            .unwrap();
        assert_eq!(outcome.mode, SimulationMode::Professional);
        assert_eq!(outcome.raw_respondents.as_ref().unwrap().len(), 10);

        let SimulationResults::Survey(results) = outcome.results else {
            panic!("expected survey results");
        };
        assert_eq!(
            results[0].aggregates,
            vec![OptionShare::new("Sí", 60), OptionShare::new("No", 40)]
        );
        assert_eq!(results[0].rationale.as_deref(), Some("Confían en la marca."));
        assert_eq!(
            results[1].aggregates,
            vec![OptionShare::new("Online", 100), OptionShare::new("Tienda", 30)]
        );
        assert_eq!(results[1].rationale, None);
    }

    #[tokio::test]
    async fn test_rationale_failure_is_not_fatal() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt, _| prompt.contains("raw_respondents"))
            .returning(|_, _| {
                let raw: Vec<Value> = (0..10)
                    .map(|_| json!({"answers": [{"questionId": "q1", "choice": "No"}]}))
                    .collect();
                Ok(json!({"raw_respondents": raw}))
            });
        generator
            .expect_generate()
            .withf(|prompt, _| prompt.contains("\"rationales\""))
            .returning(|_, _| Err(ProviderError::Timeout { timeout_ms: 60_000 }.into()));

        let outcome = simulator(generator)
            .run_payload(&survey_payload("professional", 10))
            .await
            .unwrap();
        let SimulationResults::Survey(results) = outcome.results else {
            panic!("expected survey results");
        };
        assert!(results.iter().all(|r| r.rationale.is_none()));
        assert_eq!(
            results[0].aggregates,
            vec![OptionShare::new("Sí", 0), OptionShare::new("No", 100)]
        );
    }

    #[tokio::test]
    async fn test_rationales_disabled() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().times(1).returning(|_, _| {
            let raw: Vec<Value> = (0..10)
                .map(|_| json!({"answers": [{"questionId": "q1", "choice": "Sí"}]}))
                .collect();
            Ok(json!({"raw_respondents": raw}))
        });
        let settings = SimulationSettings {
            rationales_enabled: false,
            ..SimulationSettings::default()
        };
        let outcome = Simulator::new(Arc::new(generator), settings)
            .run_payload(&survey_payload("professional", 10))
            .await
            .unwrap();
        assert_eq!(outcome.mode, SimulationMode::Professional);
    }

    #[tokio::test]
    async fn test_interview_pipeline() {
        let mut generator = MockGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_, _| {
                Ok(json!({"status": "completed", "results": [
                    {"questionId": "q1", "answers": [{"text": "Uno."}, {"text": "Dos."}, {"text": "Tres."}]}
                ]}))
            });

        let payload = json!({
            "type": "Entrevista",
            "responsesToSimulate": 2,
            "questions": [{"id": "q1", "question": "¿Qué te motiva?"}]
        });
        let outcome = simulator(generator).run_payload(&payload).await.unwrap();
        assert_eq!(outcome.mode, SimulationMode::Interview);
        let SimulationResults::Interview(results) = outcome.results else {
            panic!("expected interview results");
        };
        assert_eq!(results[0].answers.len(), 2);
        assert_eq!(results[0].question, "¿Qué te motiva?");
    }

    #[tokio::test]
    async fn test_provider_failure_aborts() {
        let mut generator = MockGenerator::new();
        generator.expect_generate().returning(|_, _| {
            Err(ProviderError::TerminalFailure {
                status: "failed".to_string(),
                reason: "server_error".to_string(),
            }
            .into())
        });
        let err = simulator(generator)
            .run_payload(&survey_payload("basic", 100))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.category(), "Error interno al simular.");
    }
}
