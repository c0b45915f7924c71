//! In-memory append-only event log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::event::{
    domain::{AgentEvent, EventId, ScopeId},
    ports::{EventLogError, EventLogRepository, EventLogResult},
};

type ScopeKey = (ScopeId, DateTime<Utc>, EventId);
type TimeKey = (DateTime<Utc>, EventId);

/// Thread-safe in-memory event log.
///
/// Events are indexed by `(scope, created_at, id)` for per-scope reads and by
/// `(created_at, id)` for the cross-scope window.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventLog {
    state: Arc<RwLock<InMemoryEventState>>,
}

#[derive(Debug, Default)]
struct InMemoryEventState {
    events: HashMap<EventId, AgentEvent>,
    by_scope: BTreeMap<ScopeKey, ()>,
    by_time: BTreeMap<TimeKey, ()>,
}

impl InMemoryEventLog {
    /// Creates an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map(|guard| guard.events.len()).unwrap_or(0)
    }

    /// Returns `true` if no events are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> EventLogResult<RwLockReadGuard<'_, InMemoryEventState>> {
        self.state
            .read()
            .map_err(|err| EventLogError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> EventLogResult<RwLockWriteGuard<'_, InMemoryEventState>> {
        self.state
            .write()
            .map_err(|err| EventLogError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl EventLogRepository for InMemoryEventLog {
    async fn append(&self, event: &AgentEvent) -> EventLogResult<()> {
        let mut state = self.write()?;
        if state.events.contains_key(&event.id()) {
            return Err(EventLogError::Duplicate(event.id()));
        }
        let created = event.created_at();
        state
            .by_scope
            .insert((event.scope_id().clone(), created, event.id()), ());
        state.by_time.insert((created, event.id()), ());
        state.events.insert(event.id(), event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: EventId) -> EventLogResult<Option<AgentEvent>> {
        let state = self.read()?;
        Ok(state.events.get(&id).cloned())
    }

    async fn list_recent(
        &self,
        scope_id: &ScopeId,
        limit: usize,
    ) -> EventLogResult<Vec<AgentEvent>> {
        let state = self.read()?;
        let recent = state
            .by_scope
            .keys()
            .rev()
            .skip_while(|(scope, _, _)| scope > scope_id)
            .take_while(|(scope, _, _)| scope == scope_id)
            .filter_map(|(_, _, id)| state.events.get(id))
            .take(limit)
            .cloned()
            .collect();
        Ok(recent)
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> EventLogResult<Vec<AgentEvent>> {
        let state = self.read()?;
        let window = state
            .by_time
            .keys()
            .skip_while(|(created, _)| *created < since)
            .filter_map(|(_, id)| state.events.get(id))
            .take(limit)
            .cloned()
            .collect();
        Ok(window)
    }
}
