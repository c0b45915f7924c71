//! Checkpoint domain: stored progress, validation, and the checkpoint
//! policy.

mod error;
mod policy;
mod record;
mod validation;

pub use error::{CheckpointError, CheckpointValidationError};
pub(crate) use record::CheckpointPayload;
pub use policy::{
    CheckpointPolicy, DEFAULT_STEP_INTERVAL, DEFAULT_TIME_INTERVAL_SECS, should_checkpoint,
};
pub use record::{CheckpointDraft, CheckpointRecord, ResumeState, SaveCheckpoint};
pub use validation::validate_checkpoint_state;
