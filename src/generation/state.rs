//! Run lifecycle state machine.
//!
//! ```text
//! Created -> MessageAttached -> Running --poll--> Running
//!                                   |-> Completed
//!                                   |-> Failed | Cancelled | Expired | Incomplete  (TerminalFailure)
//!                                   '-> RequiresAction                              (RequiresAction)
//! ```
//!
//! Only `Completed` leads to a reply. `Running` is the only phase that is
//! revisited; the caller's deadline bounds how often.

use crate::error::ProviderError;
use crate::provider::{Run, RunStatus};

/// Where a generation currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunPhase {
    /// Thread exists, no message yet.
    Created {
        /// Thread identifier.
        thread_id: String,
    },
    /// The prompt is on the thread.
    MessageAttached {
        /// Thread identifier.
        thread_id: String,
    },
    /// A run is executing.
    Running {
        /// Thread identifier.
        thread_id: String,
        /// Run identifier.
        run_id: String,
        /// Last observed status.
        status: RunStatus,
    },
    /// The run finished successfully; the reply can be read.
    Completed {
        /// Thread identifier.
        thread_id: String,
    },
}

/// Outcome of observing a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTransition {
    /// Still executing; poll again.
    Pending,
    /// Finished successfully.
    Completed,
    /// Finished without a usable result.
    Failed(ProviderError),
}

/// Classify an observed run.
#[must_use]
pub fn transition(run: &Run) -> RunTransition {
    match run.status {
        RunStatus::Completed => RunTransition::Completed,
        RunStatus::RequiresAction => RunTransition::Failed(ProviderError::RequiresAction {
            run_id: run.id.clone(),
        }),
        RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired | RunStatus::Incomplete => {
            RunTransition::Failed(ProviderError::TerminalFailure {
                status: run.status.as_str().to_string(),
                reason: run.failure_reason(),
            })
        }
        RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling | RunStatus::Unknown => {
            RunTransition::Pending
        }
    }
}

impl RunPhase {
    /// Advance a running phase after observing `run`.
    ///
    /// # Errors
    ///
    /// Returns the run's terminal failure as a [`ProviderError`].
    pub fn observe(self, run: &Run) -> Result<Self, ProviderError> {
        let thread_id = match self {
            Self::Running { thread_id, .. } => thread_id,
            other => return Ok(other),
        };
        match transition(run) {
            RunTransition::Pending => Ok(Self::Running {
                thread_id,
                run_id: run.id.clone(),
                status: run.status,
            }),
            RunTransition::Completed => Ok(Self::Completed { thread_id }),
            RunTransition::Failed(err) => Err(err),
        }
    }
}
