//! Aggregate counts for one runner pass.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counts reported at the end of [`crate::runner::services::JobRunner::run_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Batches claimed.
    pub batches: usize,
    /// Jobs the runner claimed and dispatched.
    pub attempted: usize,
    /// Jobs completed.
    pub completed: usize,
    /// Jobs failed.
    pub failed: usize,
    /// Jobs checkpointed and continued in a new job.
    pub checkpointed: usize,
    /// Due jobs left alone (unmet dependencies or claimed elsewhere).
    pub skipped: usize,
    /// Pass start.
    pub started_at: DateTime<Utc>,
    /// Pass end.
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Creates an empty summary starting at `started_at`.
    #[must_use]
    pub const fn starting(started_at: DateTime<Utc>) -> Self {
        Self {
            batches: 0,
            attempted: 0,
            completed: 0,
            failed: 0,
            checkpointed: 0,
            skipped: 0,
            started_at,
            finished_at: started_at,
        }
    }

    pub(crate) const fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Completed => self.completed += 1,
            Disposition::Failed => self.failed += 1,
            Disposition::Checkpointed => self.checkpointed += 1,
        }
    }
}

/// How a dispatched job ended in this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Completed,
    Failed,
    Checkpointed,
}
