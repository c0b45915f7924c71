//! Domain model for the append-only event log.

mod error;
mod event;
mod ids;

pub use error::EventDomainError;
pub use event::{
    AgentEvent, MAX_CONFIDENCE_FLAGS, MAX_DOWNSTREAM_EFFECTS, MAX_POLICY_CHECKS, NewEvent,
    PersistedEventData,
};
pub use ids::{EventId, EventType, ScopeId};
