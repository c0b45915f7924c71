//! `PostgreSQL` event log implementation.

use super::{models::EventRow, schema::agent_events};
use crate::event::{
    domain::{AgentEvent, EventId, EventType, PersistedEventData, ScopeId},
    ports::{EventLogError, EventLogRepository, EventLogResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::Value;

/// `PostgreSQL` connection pool type used by event adapters.
pub type EventPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed event log. Rows are only ever inserted.
#[derive(Debug, Clone)]
pub struct PostgresEventLog {
    pool: EventPgPool,
}

impl PostgresEventLog {
    /// Creates a new event log from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: EventPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> EventLogResult<T>
    where
        F: FnOnce(&mut PgConnection) -> EventLogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(EventLogError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(EventLogError::persistence)?
    }
}

#[async_trait]
impl EventLogRepository for PostgresEventLog {
    async fn append(&self, event: &AgentEvent) -> EventLogResult<()> {
        let event_id = event.id();
        let row = to_row(event);

        self.run_blocking(move |connection| {
            diesel::insert_into(agent_events::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        EventLogError::Duplicate(event_id)
                    }
                    _ => EventLogError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: EventId) -> EventLogResult<Option<AgentEvent>> {
        self.run_blocking(move |connection| {
            let row = agent_events::table
                .filter(agent_events::id.eq(id.into_inner()))
                .select(EventRow::as_select())
                .first::<EventRow>(connection)
                .optional()
                .map_err(EventLogError::persistence)?;
            row.map(row_to_event).transpose()
        })
        .await
    }

    async fn list_recent(
        &self,
        scope_id: &ScopeId,
        limit: usize,
    ) -> EventLogResult<Vec<AgentEvent>> {
        let page = i64::try_from(limit).map_err(EventLogError::persistence)?;
        let scope = scope_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = agent_events::table
                .filter(agent_events::scope_id.eq(scope))
                .order((agent_events::created_at.desc(), agent_events::id.desc()))
                .limit(page)
                .select(EventRow::as_select())
                .load::<EventRow>(connection)
                .map_err(EventLogError::persistence)?;
            rows.into_iter().map(row_to_event).collect()
        })
        .await
    }

    async fn list_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> EventLogResult<Vec<AgentEvent>> {
        let page = i64::try_from(limit).map_err(EventLogError::persistence)?;
        self.run_blocking(move |connection| {
            let rows = agent_events::table
                .filter(agent_events::created_at.ge(since))
                .order((agent_events::created_at.asc(), agent_events::id.asc()))
                .limit(page)
                .select(EventRow::as_select())
                .load::<EventRow>(connection)
                .map_err(EventLogError::persistence)?;
            rows.into_iter().map(row_to_event).collect()
        })
        .await
    }
}

fn to_row(event: &AgentEvent) -> EventRow {
    EventRow {
        id: event.id().into_inner(),
        scope_id: event.scope_id().as_str().to_owned(),
        event_type: event.event_type().as_str().to_owned(),
        payload: event.payload().clone(),
        tool: event.tool().map(str::to_owned),
        redacted_inputs: event.redacted_inputs().cloned(),
        redacted_outputs: event.redacted_outputs().cloned(),
        policy_checks: Value::Array(event.policy_checks().to_vec()),
        confidence_flags: event.confidence_flags().to_vec(),
        downstream_effects: Value::Array(event.downstream_effects().to_vec()),
        created_by: event.created_by().map(str::to_owned),
        correlation_id: event.correlation_id().map(str::to_owned),
        created_at: event.created_at(),
    }
}

fn row_to_event(row: EventRow) -> EventLogResult<AgentEvent> {
    let EventRow {
        id,
        scope_id: persisted_scope,
        event_type: persisted_type,
        payload,
        tool,
        redacted_inputs,
        redacted_outputs,
        policy_checks,
        confidence_flags,
        downstream_effects,
        created_by,
        correlation_id,
        created_at,
    } = row;

    let scope_id = ScopeId::new(persisted_scope).map_err(EventLogError::persistence)?;
    let event_type = EventType::new(persisted_type).map_err(EventLogError::persistence)?;

    Ok(AgentEvent::from_persisted(PersistedEventData {
        id: EventId::from_uuid(id),
        scope_id,
        event_type,
        payload,
        tool,
        redacted_inputs,
        redacted_outputs,
        policy_checks: json_array(policy_checks),
        confidence_flags,
        downstream_effects: json_array(downstream_effects),
        created_by,
        correlation_id,
        created_at,
    }))
}

fn json_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
