//! Checkpoint persistence on top of the event log.

use crate::checkpoint::domain::{
    CheckpointError, CheckpointPayload, CheckpointRecord, ResumeState, SaveCheckpoint,
};
use crate::event::{
    domain::{AgentEvent, EventId, EventType, NewEvent, ScopeId},
    ports::{EventLogError, EventLogRepository},
};
use crate::job::domain::JobId;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Number of recent scope events examined when looking for checkpoints.
pub const CHECKPOINT_SCAN_LIMIT: usize = 100;

/// Checkpoints kept per `(scope, job)` by [`CheckpointStore::cleanup`].
pub const DEFAULT_KEEP_LATEST: usize = 3;

/// Errors returned by the checkpoint store.
#[derive(Debug, Clone, Error)]
pub enum CheckpointStoreError {
    /// The event log failed.
    #[error(transparent)]
    EventLog(#[from] EventLogError),
    /// A stored checkpoint could not be read.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    /// The checkpoint could not be encoded.
    #[error("failed to encode checkpoint: {0}")]
    Encode(String),
}

/// Result type for checkpoint store operations.
pub type CheckpointStoreResult<T> = Result<T, CheckpointStoreError>;

/// Saves and restores job progress as `checkpoint` events.
#[derive(Clone)]
pub struct CheckpointStore<R, C>
where
    R: EventLogRepository,
    C: Clock + Send + Sync,
{
    events: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> CheckpointStore<R, C>
where
    R: EventLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates a store writing to the given event log.
    #[must_use]
    pub const fn new(events: Arc<R>, clock: Arc<C>) -> Self {
        Self { events, clock }
    }

    /// Appends a new checkpoint. Earlier checkpoints are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointStoreError::EventLog`] when the append fails.
    pub async fn save(&self, save: SaveCheckpoint) -> CheckpointStoreResult<CheckpointRecord> {
        let job_id = save.job_id;
        let (scope_id, payload) = CheckpointPayload::from_save(save);
        let body = serde_json::to_value(&payload)
            .map_err(|err| CheckpointStoreError::Encode(err.to_string()))?;
        let event = AgentEvent::record(
            NewEvent::new(scope_id, EventType::checkpoint(), body),
            &*self.clock,
        );
        self.events.append(&event).await?;
        debug!(
            checkpoint_id = %event.id(),
            scope_id = %event.scope_id(),
            job_id = ?job_id,
            step = payload.step,
            "checkpoint saved"
        );
        Ok(CheckpointRecord::from_event(&event)?)
    }

    /// Returns the newest checkpoint of a scope, optionally restricted to
    /// one job.
    ///
    /// Only the last 100 scope events are examined. The newest is the one
    /// with the greatest creation time; ties fall to the greater id.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointStoreError::EventLog`] when the read fails.
    pub async fn get_latest(
        &self,
        scope_id: &ScopeId,
        job_id: Option<JobId>,
    ) -> CheckpointStoreResult<Option<CheckpointRecord>> {
        let candidates = self.matching(scope_id, job_id).await?;
        Ok(candidates
            .into_iter()
            .max_by(|left, right| (left.created_at, left.id).cmp(&(right.created_at, right.id))))
    }

    /// Loads one checkpoint by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointStoreError::Checkpoint`] when the event exists but
    /// is not a readable checkpoint.
    pub async fn find(&self, id: EventId) -> CheckpointStoreResult<Option<CheckpointRecord>> {
        let Some(event) = self.events.find_by_id(id).await? else {
            return Ok(None);
        };
        Ok(Some(CheckpointRecord::from_event(&event)?))
    }

    /// Returns the state to resume from, or `None` when no checkpoint
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointStoreError::EventLog`] when the read fails.
    pub async fn restore(
        &self,
        scope_id: &ScopeId,
        job_id: Option<JobId>,
    ) -> CheckpointStoreResult<Option<ResumeState>> {
        Ok(self
            .get_latest(scope_id, job_id)
            .await?
            .map(CheckpointRecord::into_resume_state))
    }

    /// Counts the checkpoints beyond the `keep_latest` newest.
    ///
    /// Nothing is deleted: the event log has no delete primitive, so the
    /// count reports what a retention sweep would remove.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointStoreError::EventLog`] when the read fails.
    pub async fn cleanup(
        &self,
        scope_id: &ScopeId,
        job_id: Option<JobId>,
        keep_latest: usize,
    ) -> CheckpointStoreResult<usize> {
        let candidates = self.matching(scope_id, job_id).await?;
        let stale = candidates.len().saturating_sub(keep_latest);
        info!(
            scope_id = %scope_id,
            job_id = ?job_id,
            stale,
            "counted stale checkpoints; deletion is not wired"
        );
        Ok(stale)
    }

    async fn matching(
        &self,
        scope_id: &ScopeId,
        job_id: Option<JobId>,
    ) -> CheckpointStoreResult<Vec<CheckpointRecord>> {
        let events = self
            .events
            .list_recent(scope_id, CHECKPOINT_SCAN_LIMIT)
            .await?;
        let records = events
            .iter()
            .filter(|event| event.event_type().as_str() == EventType::CHECKPOINT)
            .filter_map(|event| match CheckpointRecord::from_event(event) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(event_id = %event.id(), error = %err, "skipping unreadable checkpoint");
                    None
                }
            })
            .filter(|record| job_id.is_none_or(|wanted| record.job_id == Some(wanted)))
            .collect();
        Ok(records)
    }
}
