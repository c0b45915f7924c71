//! Application services for the job queue.

mod queue;

pub use queue::{
    CreateJobRequest, DEFAULT_CLAIM_LIMIT, JobQueueError, JobQueueResult, JobQueueService,
    MAX_CLAIM_LIMIT,
};
