//! Error types for job domain validation and parsing.

use super::{JobId, JobStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating job values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobDomainError {
    /// The job type tag is empty after trimming.
    #[error("job type must not be empty")]
    EmptyJobType,

    /// A job was requested without a due time.
    #[error("due_at is required")]
    MissingDueAt,

    /// An operation needed a job identifier and none was supplied.
    #[error("job_id is required")]
    MissingJobId,

    /// A job identifier could not be parsed.
    #[error("invalid job identifier '{0}'")]
    InvalidJobId(String),

    /// The idempotency key is empty after trimming.
    #[error("idempotency key must not be empty")]
    EmptyIdempotencyKey,

    /// The requested status change is not permitted.
    #[error("job {job_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Job whose transition was rejected.
        job_id: JobId,
        /// Current status.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },
}

/// Error returned while parsing job statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job status: {0}")]
pub struct ParseJobStatusError(pub String);
