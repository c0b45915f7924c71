//! Per-job execution context.

use crate::checkpoint::domain::ResumeState;
use crate::job::domain::Job;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::fmt;
use std::sync::Arc;

/// Soft wall-clock budget shared by every job of one runner pass.
#[derive(Clone)]
pub struct TimeBudget {
    started_at: DateTime<Utc>,
    limit: TimeDelta,
    safety_margin: TimeDelta,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl fmt::Debug for TimeBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeBudget")
            .field("started_at", &self.started_at)
            .field("limit", &self.limit)
            .field("safety_margin", &self.safety_margin)
            .finish_non_exhaustive()
    }
}

impl TimeBudget {
    /// Starts a budget of `limit` at the clock's current time.
    #[must_use]
    pub fn start(
        clock: Arc<dyn Clock + Send + Sync>,
        limit: TimeDelta,
        safety_margin: TimeDelta,
    ) -> Self {
        Self {
            started_at: clock.utc(),
            limit,
            safety_margin,
            clock,
        }
    }

    /// Returns when the budget started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Returns the time left, never negative.
    #[must_use]
    pub fn remaining(&self) -> TimeDelta {
        let elapsed = self.now().signed_duration_since(self.started_at);
        self.limit
            .checked_sub(&elapsed)
            .filter(|left| *left > TimeDelta::zero())
            .unwrap_or_else(TimeDelta::zero)
    }

    /// Returns `true` once the remaining time is within the safety margin;
    /// long-running handlers should checkpoint and return.
    #[must_use]
    pub fn should_yield(&self) -> bool {
        self.remaining() <= self.safety_margin
    }
}

/// Everything a handler sees for one attempt.
#[derive(Debug, Clone)]
pub struct JobContext {
    job: Job,
    resume: Option<ResumeState>,
    budget: TimeBudget,
}

impl JobContext {
    /// Creates a context for a claimed job.
    #[must_use]
    pub const fn new(job: Job, resume: Option<ResumeState>, budget: TimeBudget) -> Self {
        Self {
            job,
            resume,
            budget,
        }
    }

    /// Returns the claimed job.
    #[must_use]
    pub const fn job(&self) -> &Job {
        &self.job
    }

    /// Returns the state restored from the job's checkpoint, if any.
    #[must_use]
    pub const fn resume(&self) -> Option<&ResumeState> {
        self.resume.as_ref()
    }

    /// Returns the pass budget.
    #[must_use]
    pub const fn budget(&self) -> &TimeBudget {
        &self.budget
    }

    /// Returns the current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.budget.now()
    }
}
