//! Job aggregate root and related lifecycle types.

use super::{
    IdempotencyKey, JobDomainError, JobId, JobScope, JobType, ParseJobStatusError,
    timestamp::sortable_timestamp,
};
use crate::event::domain::{EventId, ScopeId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Maximum number of characters kept from a failure message.
pub const MAX_ERROR_CHARS: usize = 900;

/// Position of a job in the due-time index, ordered by due time then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DuePosition {
    /// Earliest execution time.
    pub due_at: DateTime<Utc>,
    /// Tie-breaker within one due time.
    pub id: JobId,
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for its due time and a runner to claim it.
    Queued,
    /// Claimed by a runner and executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an unrecoverable error.
    Failed,
}

impl JobStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` for statuses that never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseJobStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseJobStatusError(value.to_owned())),
        }
    }
}

/// Validated input for a job that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    /// Handler tag.
    pub job_type: JobType,
    /// Business context.
    pub scope: JobScope,
    /// Handler-specific payload.
    pub payload: Value,
    /// Earliest execution time.
    pub due_at: DateTime<Utc>,
    /// Actor or subsystem that requested the job.
    pub requested_by: Option<String>,
    /// Jobs that must complete before this one may run.
    pub depends_on: Vec<JobId>,
    /// Optional creation token.
    pub idempotency_key: Option<IdempotencyKey>,
    /// Checkpoint a continuation job resumes from.
    pub resume_from: Option<EventId>,
}

/// Job aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    job_type: JobType,
    status: JobStatus,
    scope: JobScope,
    payload: Value,
    due_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    error: Option<String>,
    result: Option<Value>,
    checkpoint_id: Option<EventId>,
    resume_from: Option<EventId>,
    depends_on: Vec<JobId>,
    requested_by: Option<String>,
    idempotency_key: Option<IdempotencyKey>,
}

/// Parameter object for reconstructing a persisted job aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedJobData {
    /// Persisted identifier.
    pub id: JobId,
    /// Persisted handler tag.
    pub job_type: JobType,
    /// Persisted status.
    pub status: JobStatus,
    /// Persisted scope.
    pub scope: JobScope,
    /// Persisted payload.
    pub payload: Value,
    /// Persisted due time.
    pub due_at: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest change timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted claim timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Persisted terminal timestamp.
    pub finished_at: Option<DateTime<Utc>>,
    /// Persisted failure message.
    pub error: Option<String>,
    /// Persisted result payload.
    pub result: Option<Value>,
    /// Persisted checkpoint reference.
    pub checkpoint_id: Option<EventId>,
    /// Persisted resume pointer.
    pub resume_from: Option<EventId>,
    /// Persisted dependencies.
    pub depends_on: Vec<JobId>,
    /// Persisted requester.
    pub requested_by: Option<String>,
    /// Persisted idempotency key.
    pub idempotency_key: Option<IdempotencyKey>,
}

impl Job {
    /// Creates a queued job from validated input.
    #[must_use]
    pub fn queued(id: JobId, new_job: NewJob, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id,
            job_type: new_job.job_type,
            status: JobStatus::Queued,
            scope: new_job.scope,
            payload: new_job.payload,
            due_at: new_job.due_at,
            created_at: timestamp,
            updated_at: timestamp,
            started_at: None,
            finished_at: None,
            error: None,
            result: None,
            checkpoint_id: None,
            resume_from: new_job.resume_from,
            depends_on: new_job.depends_on,
            requested_by: new_job.requested_by,
            idempotency_key: new_job.idempotency_key,
        }
    }

    /// Reconstructs a job from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedJobData) -> Self {
        Self {
            id: data.id,
            job_type: data.job_type,
            status: data.status,
            scope: data.scope,
            payload: data.payload,
            due_at: data.due_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
            started_at: data.started_at,
            finished_at: data.finished_at,
            error: data.error,
            result: data.result,
            checkpoint_id: data.checkpoint_id,
            resume_from: data.resume_from,
            depends_on: data.depends_on,
            requested_by: data.requested_by,
            idempotency_key: data.idempotency_key,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the handler tag.
    #[must_use]
    pub const fn job_type(&self) -> &JobType {
        &self.job_type
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the business context.
    #[must_use]
    pub const fn scope(&self) -> &JobScope {
        &self.scope
    }

    /// Returns the partition key for events and checkpoints of this job.
    #[must_use]
    pub fn scope_id(&self) -> ScopeId {
        self.scope.scope_id()
    }

    /// Returns the handler payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the earliest execution time.
    #[must_use]
    pub const fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    /// Returns this job's position in the due-time index.
    #[must_use]
    pub const fn due_position(&self) -> DuePosition {
        DuePosition {
            due_at: self.due_at,
            id: self.id,
        }
    }

    /// Returns the due-time index key (`due_at#job_id`) for display.
    #[must_use]
    pub fn due_index_key(&self) -> String {
        format!("{}#{}", sortable_timestamp(self.due_at), self.id)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest change timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns when the job was claimed, if it has been.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the job reached a terminal status, if it has.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns the bounded failure message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the result payload.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Returns the checkpoint recorded when this job paused.
    #[must_use]
    pub const fn checkpoint_id(&self) -> Option<EventId> {
        self.checkpoint_id
    }

    /// Returns `true` once the job paused behind a checkpoint.
    #[must_use]
    pub const fn is_checkpointed(&self) -> bool {
        self.checkpoint_id.is_some()
    }

    /// Returns the checkpoint this job resumes from.
    #[must_use]
    pub const fn resume_from(&self) -> Option<EventId> {
        self.resume_from
    }

    /// Returns the jobs that must complete first.
    #[must_use]
    pub fn depends_on(&self) -> &[JobId] {
        &self.depends_on
    }

    /// Returns the requester.
    #[must_use]
    pub fn requested_by(&self) -> Option<&str> {
        self.requested_by.as_deref()
    }

    /// Returns the idempotency key.
    #[must_use]
    pub const fn idempotency_key(&self) -> Option<&IdempotencyKey> {
        self.idempotency_key.as_ref()
    }

    /// Claims the job for execution.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::InvalidStatusTransition`] unless the job is
    /// queued.
    pub fn mark_running(&mut self, at: DateTime<Utc>) -> Result<(), JobDomainError> {
        self.ensure_status(JobStatus::Queued, JobStatus::Running)?;
        self.status = JobStatus::Running;
        self.started_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Records successful completion.
    pub fn complete(&mut self, result: Value, at: DateTime<Utc>) {
        self.status = JobStatus::Completed;
        self.result = Some(result);
        self.finished_at = Some(at);
        self.updated_at = at;
    }

    /// Records a terminal failure with a bounded error message.
    pub fn fail(&mut self, error: &str, at: DateTime<Utc>) {
        self.status = JobStatus::Failed;
        self.error = Some(truncate_error(error));
        self.finished_at = Some(at);
        self.updated_at = at;
    }

    /// Records a checkpoint reference without changing status.
    pub fn attach_checkpoint(&mut self, checkpoint_id: EventId, at: DateTime<Utc>) {
        self.checkpoint_id = Some(checkpoint_id);
        self.updated_at = at;
    }

    fn ensure_status(&self, expected: JobStatus, target: JobStatus) -> Result<(), JobDomainError> {
        if self.status == expected {
            return Ok(());
        }
        Err(JobDomainError::InvalidStatusTransition {
            job_id: self.id,
            from: self.status,
            to: target,
        })
    }
}

/// Truncates an error message to [`MAX_ERROR_CHARS`] characters.
#[must_use]
pub fn truncate_error(error: &str) -> String {
    error.chars().take(MAX_ERROR_CHARS).collect()
}
