//! The contract every job type implements.

use crate::checkpoint::services::CheckpointStoreError;
use crate::event::ports::EventLogError;
use crate::job::{domain::JobType, services::JobQueueError};
use crate::notify::ports::NotifyError;
use crate::runner::domain::{JobContext, JobOutcome, PayloadError};
use crate::runner::ports::CollaboratorError;
use async_trait::async_trait;
use thiserror::Error;

/// Executes jobs of one type.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Returns the job type this handler is registered under.
    fn job_type(&self) -> JobType;

    /// Returns `true` when a failed attempt can safely resume from its last
    /// checkpoint instead of failing.
    ///
    /// A resumable handler that keeps returning a recoverable error is
    /// checkpointed and continued on every attempt, one continuation delay
    /// apart, with no retry ceiling. The step does not advance on an error,
    /// so a step limit never ends that loop. Handlers that can fail
    /// persistently must turn the error fatal themselves, for example by
    /// counting attempts in checkpoint metadata.
    fn is_resumable(&self) -> bool {
        false
    }

    /// Runs one attempt.
    ///
    /// Errors propagated with `?` are treated as recoverable without
    /// checkpoint data, except [`HandlerError::InvalidPayload`], which is
    /// fatal.
    async fn handle(&self, context: &JobContext) -> Result<JobOutcome, HandlerError>;
}

/// Errors a handler may propagate instead of building an outcome.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The payload does not match what the job type expects.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),
    /// An external collaborator failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    /// A notification could not be delivered.
    #[error(transparent)]
    Notify(#[from] NotifyError),
    /// The event log failed.
    #[error(transparent)]
    EventLog(#[from] EventLogError),
    /// The checkpoint store failed.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointStoreError),
    /// The job queue failed.
    #[error(transparent)]
    Queue(#[from] JobQueueError),
    /// A message template failed to render.
    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),
}

impl HandlerError {
    /// Converts the error into the outcome the runner acts on.
    #[must_use]
    pub fn into_outcome(self) -> JobOutcome {
        match self {
            Self::InvalidPayload(_) => JobOutcome::fatal(self.to_string()),
            _ => JobOutcome::recoverable(self.to_string()),
        }
    }
}
