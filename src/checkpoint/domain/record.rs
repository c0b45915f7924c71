//! Checkpoint records and the wire shape they are stored in.

use super::{CheckpointError, CheckpointValidationError, validation::check_data_keys};
use crate::event::domain::{AgentEvent, EventId, EventType, ScopeId};
use crate::job::domain::JobId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Progress a handler wants persisted, before a scope or owner is attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointDraft {
    /// Step counter reached so far.
    pub step: u64,
    /// Handler-defined progress object.
    pub checkpoint_data: Map<String, Value>,
    /// Tool-call history.
    pub tool_calls: Vec<Value>,
    /// Partial results keyed by the handler.
    pub intermediate_results: Map<String, Value>,
    /// Free-form annotations.
    pub metadata: Map<String, Value>,
}

impl CheckpointDraft {
    /// Creates a draft at `step` with the given progress object.
    #[must_use]
    pub fn new(step: u64, checkpoint_data: Map<String, Value>) -> Self {
        Self {
            step,
            checkpoint_data,
            ..Self::default()
        }
    }

    /// Sets the tool-call history.
    #[must_use]
    pub fn with_tool_calls(mut self, tool_calls: Vec<Value>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Sets the intermediate results.
    #[must_use]
    pub fn with_intermediate_results(mut self, results: Map<String, Value>) -> Self {
        self.intermediate_results = results;
        self
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A draft bound to the scope and job that own it.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveCheckpoint {
    /// Scope partition the checkpoint is appended to.
    pub scope_id: ScopeId,
    /// Owning job, when the checkpoint belongs to one.
    pub job_id: Option<JobId>,
    /// Progress to persist.
    pub draft: CheckpointDraft,
}

/// Event payload stored under type `checkpoint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckpointPayload {
    pub step: u64,
    #[serde(default)]
    pub checkpoint_data: Map<String, Value>,
    #[serde(default)]
    pub tool_calls: Vec<Value>,
    #[serde(default)]
    pub intermediate_results: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl CheckpointPayload {
    pub(crate) fn from_save(save: SaveCheckpoint) -> (ScopeId, Self) {
        let SaveCheckpoint {
            scope_id,
            job_id,
            draft,
        } = save;
        (
            scope_id,
            Self {
                step: draft.step,
                checkpoint_data: draft.checkpoint_data,
                tool_calls: draft.tool_calls,
                intermediate_results: draft.intermediate_results,
                metadata: draft.metadata,
                job_id,
            },
        )
    }
}

/// A stored checkpoint, read back from its event.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointRecord {
    /// Checkpoint identifier (the event identifier).
    pub id: EventId,
    /// Owning scope.
    pub scope_id: ScopeId,
    /// Owning job, if any.
    pub job_id: Option<JobId>,
    /// Step counter.
    pub step: u64,
    /// Handler-defined progress object.
    pub checkpoint_data: Map<String, Value>,
    /// Tool-call history.
    pub tool_calls: Vec<Value>,
    /// Partial results.
    pub intermediate_results: Map<String, Value>,
    /// Free-form annotations.
    pub metadata: Map<String, Value>,
    /// When the checkpoint was appended.
    pub created_at: DateTime<Utc>,
}

impl CheckpointRecord {
    /// Parses a checkpoint out of its event.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError::NotACheckpoint`] for other event types and
    /// [`CheckpointError::Malformed`] when the payload does not parse.
    pub fn from_event(event: &AgentEvent) -> Result<Self, CheckpointError> {
        if event.event_type().as_str() != EventType::CHECKPOINT {
            return Err(CheckpointError::NotACheckpoint {
                event_id: event.id().to_string(),
                event_type: event.event_type().to_string(),
            });
        }
        let payload: CheckpointPayload = serde_json::from_value(event.payload().clone())
            .map_err(|err| CheckpointError::Malformed {
                event_id: event.id().to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            id: event.id(),
            scope_id: event.scope_id().clone(),
            job_id: payload.job_id,
            step: payload.step,
            checkpoint_data: payload.checkpoint_data,
            tool_calls: payload.tool_calls,
            intermediate_results: payload.intermediate_results,
            metadata: payload.metadata,
            created_at: event.created_at(),
        })
    }

    /// Converts the record into the state a handler resumes from.
    #[must_use]
    pub fn into_resume_state(self) -> ResumeState {
        ResumeState {
            step: self.step,
            checkpoint_data: self.checkpoint_data,
            tool_calls: self.tool_calls,
            intermediate_results: self.intermediate_results,
            metadata: self.metadata,
            checkpoint_id: self.id,
            checkpoint_created_at: self.created_at,
        }
    }
}

/// Progress handed to a handler that resumes from a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeState {
    /// Step to continue from.
    pub step: u64,
    /// Handler-defined progress object.
    pub checkpoint_data: Map<String, Value>,
    /// Tool-call history.
    pub tool_calls: Vec<Value>,
    /// Partial results.
    pub intermediate_results: Map<String, Value>,
    /// Free-form annotations.
    pub metadata: Map<String, Value>,
    /// Checkpoint the state came from.
    pub checkpoint_id: EventId,
    /// When that checkpoint was appended.
    pub checkpoint_created_at: DateTime<Utc>,
}

impl ResumeState {
    /// Checks that `checkpoint_data` carries every expected key.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointValidationError::MissingKeys`] listing the absent
    /// keys.
    pub fn validate(&self, expected_keys: &[&str]) -> Result<(), CheckpointValidationError> {
        check_data_keys(&self.checkpoint_data, expected_keys)
    }

    /// Turns the state back into a draft, e.g. to re-save it unchanged.
    #[must_use]
    pub fn to_draft(&self) -> CheckpointDraft {
        CheckpointDraft {
            step: self.step,
            checkpoint_data: self.checkpoint_data.clone(),
            tool_calls: self.tool_calls.clone(),
            intermediate_results: self.intermediate_results.clone(),
            metadata: self.metadata.clone(),
        }
    }
}
