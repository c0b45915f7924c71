//! Runner domain: handler outcomes, execution context, payload reads, and
//! run summaries.

mod context;
mod outcome;
mod payload;
mod summary;

pub use context::{JobContext, TimeBudget};
pub use outcome::{Completion, FollowUp, JobOutcome};
pub use payload::{Payload, PayloadError};
pub(crate) use summary::Disposition;
pub use summary::RunSummary;
