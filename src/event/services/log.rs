//! Appending and reading audit events.

use crate::event::{
    domain::{AgentEvent, NewEvent, ScopeId},
    ports::{EventLogRepository, EventLogResult},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Upper bound on events returned by a single read.
pub const MAX_LIST_LIMIT: usize = 200;

/// Event log orchestration service.
#[derive(Clone)]
pub struct EventLogService<R, C>
where
    R: EventLogRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> EventLogService<R, C>
where
    R: EventLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new event log service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Returns the underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Stamps and appends an event, returning the stored record.
    ///
    /// # Errors
    ///
    /// Returns repository errors unchanged.
    pub async fn append(&self, new_event: NewEvent) -> EventLogResult<AgentEvent> {
        let event = AgentEvent::record(new_event, &*self.clock);
        self.repository.append(&event).await?;
        debug!(
            event_id = %event.id(),
            scope_id = %event.scope_id(),
            event_type = %event.event_type(),
            "event appended"
        );
        Ok(event)
    }

    /// Returns the newest events of a scope, newest first.
    ///
    /// `limit` is clamped to `1..=200`.
    ///
    /// # Errors
    ///
    /// Returns repository errors unchanged.
    pub async fn list_recent(
        &self,
        scope_id: &ScopeId,
        limit: usize,
    ) -> EventLogResult<Vec<AgentEvent>> {
        self.repository
            .list_recent(scope_id, limit.clamp(1, MAX_LIST_LIMIT))
            .await
    }

    /// Returns events of every scope created at or after `since`, oldest
    /// first.
    ///
    /// `limit` is clamped to `1..=200`.
    ///
    /// # Errors
    ///
    /// Returns repository errors unchanged.
    pub async fn list_recent_global(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> EventLogResult<Vec<AgentEvent>> {
        self.repository
            .list_since(since, limit.clamp(1, MAX_LIST_LIMIT))
            .await
    }
}
