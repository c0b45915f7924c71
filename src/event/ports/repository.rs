//! Repository port for appending and reading audit events.

use crate::event::domain::{AgentEvent, EventId, ScopeId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for event log operations.
pub type EventLogResult<T> = Result<T, EventLogError>;

/// Append-only event persistence contract.
#[async_trait]
pub trait EventLogRepository: Send + Sync {
    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::Duplicate`] when the identifier already
    /// exists; stored events are never overwritten.
    async fn append(&self, event: &AgentEvent) -> EventLogResult<()>;

    /// Finds an event by identifier.
    async fn find_by_id(&self, id: EventId) -> EventLogResult<Option<AgentEvent>>;

    /// Returns up to `limit` events of a scope, newest first.
    async fn list_recent(&self, scope_id: &ScopeId, limit: usize)
    -> EventLogResult<Vec<AgentEvent>>;

    /// Returns up to `limit` events of any scope created at or after
    /// `since`, oldest first.
    async fn list_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> EventLogResult<Vec<AgentEvent>>;
}

/// Errors returned by event log implementations.
#[derive(Debug, Clone, Error)]
pub enum EventLogError {
    /// An event with the same identifier already exists.
    #[error("duplicate event identifier: {0}")]
    Duplicate(EventId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl EventLogError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
