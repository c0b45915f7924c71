//! When to take a checkpoint.

use chrono::{DateTime, TimeDelta, Utc};

/// Default number of steps between checkpoints.
pub const DEFAULT_STEP_INTERVAL: u64 = 5;

/// Default wall-clock time between checkpoints, in seconds.
pub const DEFAULT_TIME_INTERVAL_SECS: i64 = 300;

/// Dual-trigger checkpoint policy: enough steps or enough time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointPolicy {
    step_interval: u64,
    time_interval: TimeDelta,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            step_interval: DEFAULT_STEP_INTERVAL,
            time_interval: TimeDelta::seconds(DEFAULT_TIME_INTERVAL_SECS),
        }
    }
}

impl CheckpointPolicy {
    /// Creates a policy with explicit intervals.
    #[must_use]
    pub const fn new(step_interval: u64, time_interval: TimeDelta) -> Self {
        Self {
            step_interval,
            time_interval,
        }
    }

    /// Returns the step interval.
    #[must_use]
    pub const fn step_interval(&self) -> u64 {
        self.step_interval
    }

    /// Returns the time interval.
    #[must_use]
    pub const fn time_interval(&self) -> TimeDelta {
        self.time_interval
    }

    /// Applies [`should_checkpoint`] with this policy's intervals.
    #[must_use]
    pub fn should_checkpoint(
        &self,
        step: u64,
        last_checkpoint_step: u64,
        last_checkpoint_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        should_checkpoint(
            step,
            last_checkpoint_step,
            self.step_interval,
            last_checkpoint_time,
            self.time_interval,
            now,
        )
    }
}

/// Returns `true` when the step counter advanced by at least
/// `step_interval` since the last checkpoint, or when at least
/// `time_interval` elapsed since it. Either condition suffices; without a
/// previous checkpoint time only the step trigger applies.
#[must_use]
pub fn should_checkpoint(
    step: u64,
    last_checkpoint_step: u64,
    step_interval: u64,
    last_checkpoint_time: Option<DateTime<Utc>>,
    time_interval: TimeDelta,
    now: DateTime<Utc>,
) -> bool {
    if step.saturating_sub(last_checkpoint_step) >= step_interval {
        return true;
    }
    last_checkpoint_time.is_some_and(|last| now.signed_duration_since(last) >= time_interval)
}
