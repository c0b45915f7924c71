//! Immutable audit events.

use super::{EventId, EventType, ScopeId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of policy-check entries kept per event.
pub const MAX_POLICY_CHECKS: usize = 50;
/// Maximum number of confidence flags kept per event.
pub const MAX_CONFIDENCE_FLAGS: usize = 25;
/// Maximum number of downstream effects kept per event.
pub const MAX_DOWNSTREAM_EFFECTS: usize = 50;

/// Input for an event that has not been appended yet.
///
/// List-valued fields are truncated to their bounds as they are set, which
/// caps the stored item size.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    scope_id: ScopeId,
    event_type: EventType,
    payload: Value,
    tool: Option<String>,
    redacted_inputs: Option<Value>,
    redacted_outputs: Option<Value>,
    policy_checks: Vec<Value>,
    confidence_flags: Vec<String>,
    downstream_effects: Vec<Value>,
    created_by: Option<String>,
    correlation_id: Option<String>,
}

impl NewEvent {
    /// Creates an event input with the required fields.
    #[must_use]
    pub const fn new(scope_id: ScopeId, event_type: EventType, payload: Value) -> Self {
        Self {
            scope_id,
            event_type,
            payload,
            tool: None,
            redacted_inputs: None,
            redacted_outputs: None,
            policy_checks: Vec::new(),
            confidence_flags: Vec::new(),
            downstream_effects: Vec::new(),
            created_by: None,
            correlation_id: None,
        }
    }

    /// Sets the tool that produced the event.
    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Sets redacted tool inputs.
    #[must_use]
    pub fn with_redacted_inputs(mut self, inputs: Value) -> Self {
        self.redacted_inputs = Some(inputs);
        self
    }

    /// Sets redacted tool outputs.
    #[must_use]
    pub fn with_redacted_outputs(mut self, outputs: Value) -> Self {
        self.redacted_outputs = Some(outputs);
        self
    }

    /// Sets policy-check results, keeping at most 50.
    #[must_use]
    pub fn with_policy_checks(mut self, checks: impl IntoIterator<Item = Value>) -> Self {
        self.policy_checks = checks.into_iter().take(MAX_POLICY_CHECKS).collect();
        self
    }

    /// Sets confidence flags, keeping at most 25.
    #[must_use]
    pub fn with_confidence_flags(mut self, flags: impl IntoIterator<Item = String>) -> Self {
        self.confidence_flags = flags.into_iter().take(MAX_CONFIDENCE_FLAGS).collect();
        self
    }

    /// Sets downstream effects, keeping at most 50.
    #[must_use]
    pub fn with_downstream_effects(mut self, effects: impl IntoIterator<Item = Value>) -> Self {
        self.downstream_effects = effects.into_iter().take(MAX_DOWNSTREAM_EFFECTS).collect();
        self
    }

    /// Sets the creator.
    #[must_use]
    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Sets the correlation identifier.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// Immutable fact about something the system did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    id: EventId,
    scope_id: ScopeId,
    event_type: EventType,
    payload: Value,
    tool: Option<String>,
    redacted_inputs: Option<Value>,
    redacted_outputs: Option<Value>,
    policy_checks: Vec<Value>,
    confidence_flags: Vec<String>,
    downstream_effects: Vec<Value>,
    created_by: Option<String>,
    correlation_id: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted event.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedEventData {
    /// Persisted identifier.
    pub id: EventId,
    /// Persisted scope.
    pub scope_id: ScopeId,
    /// Persisted type.
    pub event_type: EventType,
    /// Persisted payload.
    pub payload: Value,
    /// Persisted tool name.
    pub tool: Option<String>,
    /// Persisted redacted inputs.
    pub redacted_inputs: Option<Value>,
    /// Persisted redacted outputs.
    pub redacted_outputs: Option<Value>,
    /// Persisted policy checks.
    pub policy_checks: Vec<Value>,
    /// Persisted confidence flags.
    pub confidence_flags: Vec<String>,
    /// Persisted downstream effects.
    pub downstream_effects: Vec<Value>,
    /// Persisted creator.
    pub created_by: Option<String>,
    /// Persisted correlation identifier.
    pub correlation_id: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl AgentEvent {
    /// Records a new event at the current clock time.
    #[must_use]
    pub fn record(new_event: NewEvent, clock: &impl Clock) -> Self {
        Self {
            id: EventId::new(),
            scope_id: new_event.scope_id,
            event_type: new_event.event_type,
            payload: new_event.payload,
            tool: new_event.tool,
            redacted_inputs: new_event.redacted_inputs,
            redacted_outputs: new_event.redacted_outputs,
            policy_checks: new_event.policy_checks,
            confidence_flags: new_event.confidence_flags,
            downstream_effects: new_event.downstream_effects,
            created_by: new_event.created_by,
            correlation_id: new_event.correlation_id,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs an event from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedEventData) -> Self {
        Self {
            id: data.id,
            scope_id: data.scope_id,
            event_type: data.event_type,
            payload: data.payload,
            tool: data.tool,
            redacted_inputs: data.redacted_inputs,
            redacted_outputs: data.redacted_outputs,
            policy_checks: data.policy_checks,
            confidence_flags: data.confidence_flags,
            downstream_effects: data.downstream_effects,
            created_by: data.created_by,
            correlation_id: data.correlation_id,
            created_at: data.created_at,
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Returns the scope.
    #[must_use]
    pub const fn scope_id(&self) -> &ScopeId {
        &self.scope_id
    }

    /// Returns the event type.
    #[must_use]
    pub const fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the tool name.
    #[must_use]
    pub fn tool(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    /// Returns redacted inputs.
    #[must_use]
    pub const fn redacted_inputs(&self) -> Option<&Value> {
        self.redacted_inputs.as_ref()
    }

    /// Returns redacted outputs.
    #[must_use]
    pub const fn redacted_outputs(&self) -> Option<&Value> {
        self.redacted_outputs.as_ref()
    }

    /// Returns policy-check results.
    #[must_use]
    pub fn policy_checks(&self) -> &[Value] {
        &self.policy_checks
    }

    /// Returns confidence flags.
    #[must_use]
    pub fn confidence_flags(&self) -> &[String] {
        &self.confidence_flags
    }

    /// Returns downstream effects.
    #[must_use]
    pub fn downstream_effects(&self) -> &[Value] {
        &self.downstream_effects
    }

    /// Returns the creator.
    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Returns the correlation identifier.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
