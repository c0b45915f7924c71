//! Identifier and validated scalar types for the event log.

use super::EventDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an event record. Checkpoints reuse it as their
/// identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partition key grouping jobs, events, and checkpoints of one business
/// entity (an opportunity, an RFP).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    /// Scope used for system-wide records such as run summaries.
    pub const GLOBAL: &'static str = "global";

    /// Creates a validated scope identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EventDomainError::EmptyScopeId`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, EventDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EventDomainError::EmptyScopeId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the global scope.
    #[must_use]
    pub fn global() -> Self {
        Self(Self::GLOBAL.to_owned())
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ScopeId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag describing what an event records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    /// Checkpoint snapshots of in-progress jobs.
    pub const CHECKPOINT: &'static str = "checkpoint";
    /// Terminal job failures.
    pub const JOB_FAILED: &'static str = "job_failed";
    /// End-of-run summaries from the runner.
    pub const RUNNER_SUMMARY: &'static str = "runner_summary";
    /// Periodic job outcome aggregates.
    pub const STATE_REFRESH: &'static str = "state_refresh";

    /// Creates a validated event type.
    ///
    /// # Errors
    ///
    /// Returns [`EventDomainError::EmptyEventType`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, EventDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EventDomainError::EmptyEventType);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the checkpoint event type.
    #[must_use]
    pub fn checkpoint() -> Self {
        Self::from_static(Self::CHECKPOINT)
    }

    /// Creates a type from a non-blank literal known at compile time.
    #[must_use]
    pub(crate) fn from_static(tag: &'static str) -> Self {
        Self(tag.to_owned())
    }

    /// Returns the type as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
