//! Professional-mode batch orchestration.
//!
//! A respondent pool larger than one provider call can safely produce is
//! split into fixed-size batches. Batches run one after another, each with
//! its own deadline, and are concatenated in order. A batch that fails after
//! its single strict-JSON retry fails the whole simulation: a partial pool
//! would silently bias the aggregates.

use std::time::Duration;

use crate::aggregate::RespondentRecord;
use crate::config::BatchSettings;
use crate::error::AppError;
use crate::prompts::{persona_batch_prompt, strict_json_retry_prompt};
use crate::simulation::parse_respondents;
use crate::survey::SimulationRequest;
use crate::traits::Generator;

/// One slice of the respondent pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSlice {
    /// Zero-based batch number.
    pub index: usize,
    /// Respondents generated by earlier batches.
    pub offset: usize,
    /// Respondents in this batch.
    pub size: usize,
}

/// Partition `total` respondents into batches of at most `batch_size`.
///
/// A zero `batch_size` is treated as 1.
///
/// ```
/// use survey_simulator::batch::plan_batches;
///
/// let sizes: Vec<usize> = plan_batches(250, 100).iter().map(|b| b.size).collect();
/// assert_eq!(sizes, vec![100, 100, 50]);
/// assert!(plan_batches(0, 100).is_empty());
/// ```
#[must_use]
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<BatchSlice> {
    let batch_size = batch_size.max(1);
    (0..total.div_ceil(batch_size))
        .map(|index| {
            let offset = index * batch_size;
            BatchSlice {
                index,
                offset,
                size: batch_size.min(total - offset),
            }
        })
        .collect()
}

/// Generates a professional respondent pool through a [`Generator`].
#[derive(Debug)]
pub struct BatchOrchestrator<'a, G: ?Sized> {
    generator: &'a G,
    settings: BatchSettings,
}

impl<'a, G: Generator + ?Sized> BatchOrchestrator<'a, G> {
    /// Create an orchestrator.
    #[must_use]
    pub const fn new(generator: &'a G, settings: BatchSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Generate all `request.respondent_count` respondents.
    ///
    /// Respondent ids run `r0001` upward across batches with no gaps.
    ///
    /// # Errors
    ///
    /// Returns the first batch failure.
    pub async fn run(&self, request: &SimulationRequest) -> Result<Vec<RespondentRecord>, AppError> {
        let total = usize::try_from(request.respondent_count).unwrap_or(usize::MAX);
        let batch_size = usize::try_from(self.settings.size).unwrap_or(usize::MAX);
        let plan = plan_batches(total, batch_size);

        let mut respondents = Vec::with_capacity(total);
        for slice in &plan {
            let batch = self.run_batch(request, *slice).await?;
            respondents.extend(batch);
        }

        tracing::info!(
            respondents = respondents.len(),
            batches = plan.len(),
            "Respondent pool complete"
        );
        Ok(respondents)
    }

    /// Generate one batch, retrying once with a strict-JSON prompt on parse failure.
    async fn run_batch(
        &self,
        request: &SimulationRequest,
        slice: BatchSlice,
    ) -> Result<Vec<RespondentRecord>, AppError> {
        let timeout = Duration::from_millis(
            self.settings
                .timeout_ms(slice.size, request.questions.len()),
        );
        let prompt = persona_batch_prompt(request, slice.offset, slice.size);

        tracing::info!(
            batch = slice.index,
            offset = slice.offset,
            size = slice.size,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "Starting batch"
        );

        match self.attempt(request, slice, prompt.clone(), timeout).await {
            Err(err) if err.is_parse() => {
                tracing::warn!(batch = slice.index, error = %err, "Batch output unparsable, retrying with strict JSON");
                self.attempt(request, slice, strict_json_retry_prompt(&prompt), timeout)
                    .await
                    .map_err(|e| {
                        tracing::error!(batch = slice.index, error = %e, "Batch failed after retry");
                        e
                    })
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        request: &SimulationRequest,
        slice: BatchSlice,
        prompt: String,
        timeout: Duration,
    ) -> Result<Vec<RespondentRecord>, AppError> {
        let value = self.generator.generate(prompt, timeout).await?;
        let respondents =
            parse_respondents(&value, &request.questions, slice.index, slice.offset, slice.size)?;
        tracing::info!(
            batch = slice.index,
            offset = slice.offset,
            size = slice.size,
            "Batch complete"
        );
        Ok(respondents)
    }
}
