//! Error types for event domain validation.

use thiserror::Error;

/// Errors returned while constructing event values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventDomainError {
    /// The scope identifier is empty after trimming.
    #[error("scope id must not be empty")]
    EmptyScopeId,

    /// The event type is empty after trimming.
    #[error("event type must not be empty")]
    EmptyEventType,
}
