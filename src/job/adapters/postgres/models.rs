//! Diesel row models for job persistence.

use super::schema::agent_jobs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for job records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = agent_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Handler tag.
    pub job_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Scope JSON object.
    pub scope: Value,
    /// Payload JSON.
    pub payload: Value,
    /// Due time.
    pub due_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest change timestamp.
    pub updated_at: DateTime<Utc>,
    /// Claim timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal timestamp.
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure message.
    pub error: Option<String>,
    /// Result payload.
    pub result: Option<Value>,
    /// Checkpoint reference.
    pub checkpoint_id: Option<uuid::Uuid>,
    /// Resume pointer.
    pub resume_from: Option<uuid::Uuid>,
    /// Prerequisite job identifiers.
    pub depends_on: Vec<uuid::Uuid>,
    /// Requesting actor.
    pub requested_by: Option<String>,
    /// Creation token.
    pub idempotency_key: Option<String>,
}

/// Insert model for job records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = agent_jobs)]
pub struct NewJobRow {
    /// Job identifier.
    pub id: uuid::Uuid,
    /// Handler tag.
    pub job_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Scope JSON object.
    pub scope: Value,
    /// Payload JSON.
    pub payload: Value,
    /// Due time.
    pub due_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest change timestamp.
    pub updated_at: DateTime<Utc>,
    /// Resume pointer.
    pub resume_from: Option<uuid::Uuid>,
    /// Prerequisite job identifiers.
    pub depends_on: Vec<uuid::Uuid>,
    /// Requesting actor.
    pub requested_by: Option<String>,
    /// Creation token.
    pub idempotency_key: Option<String>,
}
