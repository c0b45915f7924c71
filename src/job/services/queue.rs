//! Service layer for creating, claiming, and finishing jobs.

use crate::event::domain::{EventId, ScopeId};
use crate::job::{
    domain::{
        DuePosition, IdempotencyKey, Job, JobDomainError, JobId, JobScope, JobStatus, JobType,
        NewJob,
    },
    ports::{JobRepository, JobRepositoryError, JobRepositoryResult},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Default number of jobs claimed per batch.
pub const DEFAULT_CLAIM_LIMIT: usize = 25;

/// Upper bound on jobs claimed per batch.
pub const MAX_CLAIM_LIMIT: usize = 100;

/// Number of index entries scanned by the filtered list operations.
const LIST_SCAN_WINDOW: usize = 1000;

/// Request payload for creating a job.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateJobRequest {
    job_type: String,
    scope: JobScope,
    payload: Value,
    due_at: Option<DateTime<Utc>>,
    requested_by: Option<String>,
    depends_on: Vec<JobId>,
    idempotency_key: Option<String>,
    resume_from: Option<EventId>,
}

impl CreateJobRequest {
    /// Creates a request for the given job type with an empty payload and no
    /// due time.
    #[must_use]
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            job_type: job_type.into(),
            scope: JobScope::new(),
            payload: Value::Object(serde_json::Map::new()),
            due_at: None,
            requested_by: None,
            depends_on: Vec::new(),
            idempotency_key: None,
            resume_from: None,
        }
    }

    /// Sets the due time.
    #[must_use]
    pub const fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Sets the business context.
    #[must_use]
    pub fn with_scope(mut self, scope: JobScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the handler payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Sets the requester.
    #[must_use]
    pub fn with_requested_by(mut self, requested_by: impl Into<String>) -> Self {
        self.requested_by = Some(requested_by.into());
        self
    }

    /// Sets prerequisite jobs.
    #[must_use]
    pub fn with_depends_on(mut self, depends_on: impl IntoIterator<Item = JobId>) -> Self {
        self.depends_on = depends_on.into_iter().collect();
        self
    }

    /// Sets an idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Points the new job at a checkpoint to resume from.
    #[must_use]
    pub const fn with_resume_from(mut self, checkpoint_id: EventId) -> Self {
        self.resume_from = Some(checkpoint_id);
        self
    }

    fn into_new_job(self) -> Result<NewJob, JobDomainError> {
        let due_at = self.due_at.ok_or(JobDomainError::MissingDueAt)?;
        let job_type = JobType::new(self.job_type)?;
        let idempotency_key = self.idempotency_key.map(IdempotencyKey::new).transpose()?;
        Ok(NewJob {
            job_type,
            scope: self.scope,
            payload: self.payload,
            due_at,
            requested_by: self.requested_by,
            depends_on: self.depends_on,
            idempotency_key,
            resume_from: self.resume_from,
        })
    }
}

/// Service-level errors for job queue operations.
#[derive(Debug, Error)]
pub enum JobQueueError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] JobDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] JobRepositoryError),
}

/// Result type for job queue service operations.
pub type JobQueueResult<T> = Result<T, JobQueueError>;

/// Job queue orchestration service.
#[derive(Clone)]
pub struct JobQueueService<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> JobQueueService<R, C>
where
    R: JobRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new job queue service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Returns the current time from the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Creates a job.
    ///
    /// With an idempotency key the identifier is derived from the key, and a
    /// repeated creation returns the job stored the first time. Without one
    /// a fresh identifier is generated and a write conflict is retried once.
    ///
    /// # Errors
    ///
    /// Returns [`JobDomainError::MissingDueAt`] when no due time was set,
    /// other domain errors for invalid input, or repository errors.
    pub async fn create(&self, request: CreateJobRequest) -> JobQueueResult<Job> {
        let new_job = request.into_new_job()?;

        if let Some(key) = new_job.idempotency_key.clone() {
            let id = JobId::from_idempotency_key(&key);
            let job = Job::queued(id, new_job, &*self.clock);
            return match self.repository.create(&job).await {
                Ok(()) => Ok(job),
                Err(JobRepositoryError::DuplicateJob(existing)) => {
                    debug!(job_id = %existing, idempotency_key = %key, "returning existing job");
                    self.repository
                        .find_by_id(existing)
                        .await?
                        .ok_or(JobQueueError::Repository(JobRepositoryError::NotFound(existing)))
                }
                Err(err) => Err(err.into()),
            };
        }

        let job = Job::queued(JobId::new(), new_job.clone(), &*self.clock);
        match self.repository.create(&job).await {
            Ok(()) => Ok(job),
            Err(JobRepositoryError::DuplicateJob(conflict)) => {
                warn!(job_id = %conflict, "job id conflict on create; retrying once");
                let retry = Job::queued(JobId::new(), new_job, &*self.clock);
                self.repository.create(&retry).await?;
                Ok(retry)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Finds a job by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the lookup fails.
    pub async fn find(&self, id: JobId) -> JobQueueResult<Option<Job>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Returns queued jobs that are due now, ascending by due time.
    ///
    /// `limit` is clamped to `1..=100`. Does not mutate state.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the index query fails.
    pub async fn claim_due(&self, limit: usize) -> JobQueueResult<Vec<Job>> {
        self.claim_due_after(None, limit).await
    }

    /// Returns queued jobs that are due now and sit past `after` in the
    /// due-time index.
    ///
    /// Lets a drain loop step over jobs it left queued earlier in the same
    /// pass. `limit` is clamped to `1..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the index query fails.
    pub async fn claim_due_after(
        &self,
        after: Option<DuePosition>,
        limit: usize,
    ) -> JobQueueResult<Vec<Job>> {
        let bounded = limit.clamp(1, MAX_CLAIM_LIMIT);
        Ok(self.repository.due(self.clock.utc(), after, bounded).await?)
    }

    /// Atomically moves a job from `queued` to `running`.
    ///
    /// Returns `Ok(None)` when another claimer already won.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the conditional write fails
    /// for reasons other than a lost race.
    pub async fn try_mark_running(&self, id: JobId) -> JobQueueResult<Option<Job>> {
        Ok(self.repository.try_mark_running(id, self.clock.utc()).await?)
    }

    /// Records successful completion.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the job is missing or the
    /// write fails.
    pub async fn complete(&self, id: JobId, result: Value) -> JobQueueResult<()> {
        Ok(self.repository.complete(id, result, self.clock.utc()).await?)
    }

    /// Records a terminal failure; the message is truncated to 900
    /// characters.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the job is missing or the
    /// write fails.
    pub async fn fail(&self, id: JobId, error: &str) -> JobQueueResult<()> {
        Ok(self.repository.fail(id, error, self.clock.utc()).await?)
    }

    /// Records a checkpoint reference without changing status.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the job is missing or the
    /// write fails.
    pub async fn mark_checkpointed(&self, id: JobId, checkpoint_id: EventId) -> JobQueueResult<()> {
        Ok(self
            .repository
            .mark_checkpointed(id, checkpoint_id, self.clock.utc())
            .await?)
    }

    /// Lists recent jobs, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the scan fails.
    pub async fn list_recent(
        &self,
        limit: usize,
        status: Option<JobStatus>,
    ) -> JobQueueResult<Vec<Job>> {
        self.list_filtered(limit, |job| status_matches(job, status))
            .await
    }

    /// Lists recent jobs for a scope, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the scan fails.
    pub async fn list_by_scope(
        &self,
        scope_id: &ScopeId,
        limit: usize,
        status: Option<JobStatus>,
    ) -> JobQueueResult<Vec<Job>> {
        self.list_filtered(limit, |job| {
            job.scope_id() == *scope_id && status_matches(job, status)
        })
        .await
    }

    /// Lists recent jobs of a type, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when the scan fails.
    pub async fn list_by_type(
        &self,
        job_type: &JobType,
        limit: usize,
        status: Option<JobStatus>,
    ) -> JobQueueResult<Vec<Job>> {
        self.list_filtered(limit, |job| {
            job.job_type() == job_type && status_matches(job, status)
        })
        .await
    }

    /// Returns `true` when every prerequisite of `job` has completed.
    ///
    /// A missing prerequisite counts as unmet.
    ///
    /// # Errors
    ///
    /// Returns [`JobQueueError::Repository`] when a lookup fails.
    pub async fn dependencies_met(&self, job: &Job) -> JobQueueResult<bool> {
        for dependency in job.depends_on() {
            let status = self
                .repository
                .find_by_id(*dependency)
                .await?
                .map(|found| found.status());
            if status != Some(JobStatus::Completed) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn list_filtered(
        &self,
        limit: usize,
        keep: impl Fn(&Job) -> bool,
    ) -> JobQueueResult<Vec<Job>> {
        let window: JobRepositoryResult<Vec<Job>> =
            self.repository.list_recent(LIST_SCAN_WINDOW).await;
        Ok(window?.into_iter().filter(|job| keep(job)).take(limit).collect())
    }
}

fn status_matches(job: &Job, status: Option<JobStatus>) -> bool {
    status.is_none_or(|expected| job.status() == expected)
}
