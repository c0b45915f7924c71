//! Repository port for job persistence, due-time lookup, and claiming.

use crate::event::domain::EventId;
use crate::job::domain::{DuePosition, Job, JobId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for job repository operations.
pub type JobRepositoryResult<T> = Result<T, JobRepositoryError>;

/// Job persistence contract.
///
/// Implementations must make [`JobRepository::try_mark_running`] atomic:
/// concurrent callers for the same job see exactly one success.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Stores a new job together with its due-time index entry.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::DuplicateJob`] when the identifier is
    /// already taken.
    async fn create(&self, job: &Job) -> JobRepositoryResult<()>;

    /// Finds a job by identifier.
    ///
    /// Returns `None` when the job does not exist.
    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>>;

    /// Returns queued jobs due at or before `now`, ordered by due time then
    /// identifier, at most `limit` of them.
    ///
    /// With `after` set, only index positions strictly past it are read, so
    /// callers can page over jobs they chose to leave queued. Status is
    /// rechecked against the primary record, so index entries for jobs that
    /// already moved on are skipped. Never mutates state.
    async fn due(
        &self,
        now: DateTime<Utc>,
        after: Option<DuePosition>,
        limit: usize,
    ) -> JobRepositoryResult<Vec<Job>>;

    /// Atomically moves a job from `queued` to `running`.
    ///
    /// Returns `None` when the job is no longer queued, which means another
    /// claimer won the race.
    async fn try_mark_running(
        &self,
        id: JobId,
        at: DateTime<Utc>,
    ) -> JobRepositoryResult<Option<Job>>;

    /// Records successful completion.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::NotFound`] when the job does not exist.
    async fn complete(&self, id: JobId, result: Value, at: DateTime<Utc>)
    -> JobRepositoryResult<()>;

    /// Records a terminal failure. The error is truncated by the domain.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::NotFound`] when the job does not exist.
    async fn fail(&self, id: JobId, error: &str, at: DateTime<Utc>) -> JobRepositoryResult<()>;

    /// Records a checkpoint reference without changing status.
    ///
    /// # Errors
    ///
    /// Returns [`JobRepositoryError::NotFound`] when the job does not exist.
    async fn mark_checkpointed(
        &self,
        id: JobId,
        checkpoint_id: EventId,
        at: DateTime<Utc>,
    ) -> JobRepositoryResult<()>;

    /// Returns up to `limit` jobs, latest due time first.
    async fn list_recent(&self, limit: usize) -> JobRepositoryResult<Vec<Job>>;
}

/// Errors returned by job repository implementations.
#[derive(Debug, Clone, Error)]
pub enum JobRepositoryError {
    /// A job with the same identifier already exists.
    #[error("duplicate job identifier: {0}")]
    DuplicateJob(JobId),

    /// The job was not found.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl JobRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
