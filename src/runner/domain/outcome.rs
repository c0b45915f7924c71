//! What a handler reports back to the runner.

use crate::checkpoint::domain::CheckpointDraft;
use crate::job::domain::JobType;
use chrono::TimeDelta;
use serde_json::Value;

/// Result of one handler invocation.
///
/// The variant decides what happens to the job: completion, a checkpoint
/// followed by a continuation job, or a terminal failure.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The work finished.
    Completed(Completion),
    /// The handler yielded before its budget ran out; persist the draft and
    /// continue in a fresh job.
    Suspended(CheckpointDraft),
    /// The attempt failed but may succeed on a later try.
    Recoverable {
        /// Failure description.
        error: String,
        /// Progress to resume from, when the handler has any.
        checkpoint: Option<CheckpointDraft>,
    },
    /// The attempt failed and retrying would not help.
    Fatal(String),
}

impl JobOutcome {
    /// A completion with `result` and no follow-up job.
    #[must_use]
    pub const fn completed(result: Value) -> Self {
        Self::Completed(Completion::new(result))
    }

    /// A recoverable failure without checkpoint data.
    #[must_use]
    pub fn recoverable(error: impl Into<String>) -> Self {
        Self::Recoverable {
            error: error.into(),
            checkpoint: None,
        }
    }

    /// A fatal failure.
    #[must_use]
    pub fn fatal(error: impl Into<String>) -> Self {
        Self::Fatal(error.into())
    }
}

/// A successful result, optionally scheduling more work.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Result stored on the job.
    pub result: Value,
    /// Job to enqueue after completion.
    pub follow_up: Option<FollowUp>,
}

impl Completion {
    /// Creates a completion without follow-up.
    #[must_use]
    pub const fn new(result: Value) -> Self {
        Self {
            result,
            follow_up: None,
        }
    }

    /// Schedules `follow_up` once this job completes.
    #[must_use]
    pub fn then(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}

impl From<Completion> for JobOutcome {
    fn from(completion: Completion) -> Self {
        Self::Completed(completion)
    }
}

/// A job to enqueue after the current one completes, in the same scope.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUp {
    /// Type of the new job; `None` reuses the current job's type.
    pub job_type: Option<JobType>,
    /// Payload of the new job.
    pub payload: Value,
    /// Delay from completion until the new job is due.
    pub delay: TimeDelta,
}

impl FollowUp {
    /// Reschedules the same job type.
    #[must_use]
    pub const fn same_type(payload: Value, delay: TimeDelta) -> Self {
        Self {
            job_type: None,
            payload,
            delay,
        }
    }

    /// Schedules a job of another type.
    #[must_use]
    pub const fn of_type(job_type: JobType, payload: Value, delay: TimeDelta) -> Self {
        Self {
            job_type: Some(job_type),
            payload,
            delay,
        }
    }
}
