//! Domain model for deferred jobs.
//!
//! Jobs are units of deferred work: queued with a due time, claimed exactly
//! once per attempt, and finished as completed or failed. Infrastructure
//! concerns stay outside this boundary.

mod error;
mod ids;
mod job;
mod scope;
pub mod timestamp;

pub use error::{JobDomainError, ParseJobStatusError};
pub use ids::{IdempotencyKey, JobId, JobType};
pub use job::{DuePosition, Job, JobStatus, MAX_ERROR_CHARS, NewJob, PersistedJobData, truncate_error};
pub use scope::JobScope;
