//! Error types for checkpoint parsing and validation.

use thiserror::Error;

/// Reasons a checkpoint state is unfit for resumption.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointValidationError {
    /// The state itself is not a JSON object.
    #[error("checkpoint state must be an object")]
    StateNotObject,

    /// `checkpointData` is absent or not a JSON object.
    #[error("checkpoint_data must be an object")]
    DataNotObject,

    /// `step` is absent.
    #[error("step is required")]
    MissingStep,

    /// `step` is present but not an integer.
    #[error("step must be an integer")]
    InvalidStep,

    /// `step` is negative.
    #[error("step must be non-negative, got {0}")]
    NegativeStep(i64),

    /// Keys the caller expects are absent from `checkpointData`.
    #[error("checkpoint_data is missing keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// Errors raised while reading checkpoint events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointError {
    /// The event is not a checkpoint.
    #[error("event {event_id} has type '{event_type}', not checkpoint")]
    NotACheckpoint {
        /// Offending event.
        event_id: String,
        /// Its actual type.
        event_type: String,
    },

    /// The event payload does not match the checkpoint shape.
    #[error("malformed checkpoint {event_id}: {reason}")]
    Malformed {
        /// Offending event.
        event_id: String,
        /// Parser message.
        reason: String,
    },
}
