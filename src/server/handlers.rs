//! HTTP handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::error::{AppError, ValidationError};
use crate::metrics::{MetricEvent, MetricsSummary, Timer};
use crate::simulation::{ErrorResponse, SimulationResponse};
use crate::survey::normalize_payload;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `true` while the process serves requests.
    pub ok: bool,
    /// Human-readable status.
    pub status: String,
    /// Time of the probe.
    pub ts: DateTime<Utc>,
    /// Whether a provider API key is configured.
    pub has_key: bool,
    /// Whether an assistant identifier is configured.
    pub has_assistant: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Simulation failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Simulation rejected");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        status: "API running".to_string(),
        ts: Utc::now(),
        has_key: state.config.api_key.as_ref().is_some_and(|k| !k.is_blank()),
        has_assistant: state.config.assistant_id.is_some(),
    })
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.metrics.summary())
}

/// `POST /simulations/run` and its legacy alias.
///
/// The body is read raw so malformed JSON gets the same error envelope as
/// every other rejection.
pub async fn run_simulation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SimulationResponse>, AppError> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        AppError::from(ValidationError::InvalidPayload {
            message: format!("body is not valid JSON: {e}"),
        })
    })?;
    let request = normalize_payload(&payload)?;
    let mode = request.simulation_mode();

    let timer = Timer::start();
    let result = state.simulator.run(&request).await;
    let latency_ms = timer.elapsed_ms();

    match result {
        Ok(outcome) => {
            state
                .metrics
                .record(MetricEvent::new(mode.as_str(), latency_ms, true));
            let response = SimulationResponse::from_outcome(outcome);
            tracing::info!(
                simulation_id = %response.simulation_id,
                mode = %mode,
                results = response.results.len(),
                latency_ms,
                "Simulation completed"
            );
            Ok(Json(response))
        }
        Err(err) => {
            state.metrics.record(
                MetricEvent::new(mode.as_str(), latency_ms, false).with_error(err.category()),
            );
            Err(err)
        }
    }
}
