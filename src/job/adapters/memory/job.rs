//! In-memory repository for job queue tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::event::domain::EventId;
use crate::job::{
    domain::{DuePosition, Job, JobId, JobStatus},
    ports::{JobRepository, JobRepositoryError, JobRepositoryResult},
};

/// Thread-safe in-memory job repository.
///
/// Holds a primary map and a due-time index ordered by `(due_at, job_id)`,
/// mirroring the partition-plus-sort-key layout of the durable store. The
/// write lock makes the `queued → running` swap atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobRepository {
    state: Arc<RwLock<InMemoryJobState>>,
}

#[derive(Debug, Default)]
struct InMemoryJobState {
    jobs: HashMap<JobId, Job>,
    due_index: BTreeSet<DuePosition>,
}

impl InMemoryJobRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map(|guard| guard.jobs.len()).unwrap_or(0)
    }

    /// Returns `true` if no jobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> JobRepositoryResult<RwLockReadGuard<'_, InMemoryJobState>> {
        self.state.read().map_err(|err| {
            JobRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> JobRepositoryResult<RwLockWriteGuard<'_, InMemoryJobState>> {
        self.state.write().map_err(|err| {
            JobRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn update_with(
        &self,
        id: JobId,
        apply: impl FnOnce(&mut Job),
    ) -> JobRepositoryResult<()> {
        let mut state = self.write()?;
        let job = state.jobs.get_mut(&id).ok_or(JobRepositoryError::NotFound(id))?;
        apply(job);
        Ok(())
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> JobRepositoryResult<()> {
        let mut state = self.write()?;
        if state.jobs.contains_key(&job.id()) {
            return Err(JobRepositoryError::DuplicateJob(job.id()));
        }
        state.due_index.insert(job.due_position());
        state.jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        let state = self.read()?;
        Ok(state.jobs.get(&id).cloned())
    }

    async fn due(
        &self,
        now: DateTime<Utc>,
        after: Option<DuePosition>,
        limit: usize,
    ) -> JobRepositoryResult<Vec<Job>> {
        let state = self.read()?;
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);
        let due = state
            .due_index
            .range((lower, Bound::Unbounded))
            .take_while(|position| position.due_at <= now)
            .filter_map(|position| state.jobs.get(&position.id))
            .filter(|job| job.status() == JobStatus::Queued)
            .take(limit)
            .cloned()
            .collect();
        Ok(due)
    }

    async fn try_mark_running(
        &self,
        id: JobId,
        at: DateTime<Utc>,
    ) -> JobRepositoryResult<Option<Job>> {
        let mut state = self.write()?;
        let Some(job) = state.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if job.mark_running(at).is_err() {
            return Ok(None);
        }
        Ok(Some(job.clone()))
    }

    async fn complete(
        &self,
        id: JobId,
        result: Value,
        at: DateTime<Utc>,
    ) -> JobRepositoryResult<()> {
        self.update_with(id, |job| job.complete(result, at))
    }

    async fn fail(&self, id: JobId, error: &str, at: DateTime<Utc>) -> JobRepositoryResult<()> {
        self.update_with(id, |job| job.fail(error, at))
    }

    async fn mark_checkpointed(
        &self,
        id: JobId,
        checkpoint_id: EventId,
        at: DateTime<Utc>,
    ) -> JobRepositoryResult<()> {
        self.update_with(id, |job| job.attach_checkpoint(checkpoint_id, at))
    }

    async fn list_recent(&self, limit: usize) -> JobRepositoryResult<Vec<Job>> {
        let state = self.read()?;
        let recent = state
            .due_index
            .iter()
            .rev()
            .filter_map(|position| state.jobs.get(&position.id))
            .take(limit)
            .cloned()
            .collect();
        Ok(recent)
    }
}
