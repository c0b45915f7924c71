//! Diesel row models for the event log.

use super::schema::agent_events;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query and insert row for event records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = agent_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EventRow {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Partition key.
    pub scope_id: String,
    /// Event tag.
    pub event_type: String,
    /// Payload JSON.
    pub payload: Value,
    /// Producing tool.
    pub tool: Option<String>,
    /// Redacted inputs.
    pub redacted_inputs: Option<Value>,
    /// Redacted outputs.
    pub redacted_outputs: Option<Value>,
    /// Policy checks as a JSON array.
    pub policy_checks: Value,
    /// Confidence flags.
    pub confidence_flags: Vec<String>,
    /// Downstream effects as a JSON array.
    pub downstream_effects: Value,
    /// Creating actor.
    pub created_by: Option<String>,
    /// Correlation identifier.
    pub correlation_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
