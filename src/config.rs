//! Runner configuration.
//!
//! Defaults match the host's execution limits: a 25 minute wall-clock
//! budget with a one minute safety margin before the hard cutoff.

use chrono::TimeDelta;
use serde::Deserialize;
use thiserror::Error;

use crate::job::domain::timestamp::seconds;
use crate::job::services::{DEFAULT_CLAIM_LIMIT, MAX_CLAIM_LIMIT};

/// Prefix shared by every configuration environment variable.
pub const ENV_PREFIX: &str = "BIDFORGE_";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is present but does not parse.
    #[error("invalid value '{value}' for {name}: expected {expected}")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Raw value.
        value: String,
        /// What was expected.
        expected: &'static str,
    },
}

/// Tunables for one runner pass.
///
/// # Examples
///
/// ```
/// use bidforge::config::RunnerConfig;
///
/// let config = RunnerConfig::default().with_batch_limit(500);
/// assert_eq!(config.batch_limit, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Jobs claimed per batch, within `1..=100`.
    pub batch_limit: usize,
    /// Upper bound on batches drained by one pass.
    pub max_batches: usize,
    /// Soft wall-clock budget for one pass, in seconds.
    pub time_budget_secs: u64,
    /// Remaining budget below which handlers checkpoint and yield, in
    /// seconds.
    pub safety_margin_secs: u64,
    /// Delay before a continuation job becomes due, in seconds.
    pub continuation_delay_secs: u64,
    /// Steps between periodic checkpoints.
    ///
    /// This and the next two settings feed the universal executor, which
    /// the embedding application registers together with its own step
    /// executor. The `job_runner` binary ships no step executor, so it
    /// loads them without reading them.
    pub checkpoint_step_interval: u64,
    /// Seconds between periodic checkpoints.
    pub checkpoint_time_interval_secs: u64,
    /// Step ceiling for multi-step executions.
    pub max_steps: u64,
    /// Chat channel receiving run summaries.
    pub summary_channel: Option<String>,
    /// Default digest recipients.
    pub digest_recipients: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            batch_limit: DEFAULT_CLAIM_LIMIT,
            max_batches: 50,
            time_budget_secs: 25 * 60,
            safety_margin_secs: 60,
            continuation_delay_secs: 3 * 60,
            checkpoint_step_interval: 5,
            checkpoint_time_interval_secs: 5 * 60,
            max_steps: 200,
            summary_channel: None,
            digest_recipients: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Sets the batch limit, clamped to `1..=100`.
    #[must_use]
    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit.clamp(1, MAX_CLAIM_LIMIT);
        self
    }

    /// Sets the time budget.
    #[must_use]
    pub const fn with_time_budget_secs(mut self, secs: u64) -> Self {
        self.time_budget_secs = secs;
        self
    }

    /// Sets the safety margin.
    #[must_use]
    pub const fn with_safety_margin_secs(mut self, secs: u64) -> Self {
        self.safety_margin_secs = secs;
        self
    }

    /// Sets the continuation delay.
    #[must_use]
    pub const fn with_continuation_delay_secs(mut self, secs: u64) -> Self {
        self.continuation_delay_secs = secs;
        self
    }

    /// Sets the summary channel.
    #[must_use]
    pub fn with_summary_channel(mut self, channel: Option<String>) -> Self {
        self.summary_channel = channel.filter(|value| !value.trim().is_empty());
        self
    }

    /// Sets the digest recipients.
    #[must_use]
    pub fn with_digest_recipients(mut self, recipients: Vec<String>) -> Self {
        self.digest_recipients = recipients;
        self
    }

    /// Returns the time budget as a [`TimeDelta`].
    #[must_use]
    pub fn time_budget(&self) -> TimeDelta {
        seconds(self.time_budget_secs)
    }

    /// Returns the safety margin as a [`TimeDelta`].
    #[must_use]
    pub fn safety_margin(&self) -> TimeDelta {
        seconds(self.safety_margin_secs)
    }

    /// Returns the continuation delay as a [`TimeDelta`].
    #[must_use]
    pub fn continuation_delay(&self) -> TimeDelta {
        seconds(self.continuation_delay_secs)
    }

    /// Returns the periodic checkpoint time interval.
    #[must_use]
    pub fn checkpoint_time_interval(&self) -> TimeDelta {
        seconds(self.checkpoint_time_interval_secs)
    }

    /// Loads the configuration from `BIDFORGE_*` environment variables over
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through `lookup`, which maps full variable
    /// names (e.g. `BIDFORGE_BATCH_LIMIT`) to values.
    ///
    /// Recognised suffixes: `BATCH_LIMIT`, `MAX_BATCHES`,
    /// `TIME_BUDGET_SECS`, `SAFETY_MARGIN_SECS`, `CONTINUATION_DELAY_SECS`,
    /// `CHECKPOINT_STEP_INTERVAL`, `CHECKPOINT_TIME_INTERVAL_SECS`,
    /// `MAX_STEPS`, `SUMMARY_CHANNEL`, and `DIGEST_RECIPIENTS`
    /// (comma-separated).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |suffix: &str| {
            let name = format!("{ENV_PREFIX}{suffix}");
            lookup(&name)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (name, value))
        };
        let mut config = Self::default();

        if let Some((name, value)) = get("BATCH_LIMIT") {
            config = config.with_batch_limit(parse_number(&name, &value)?);
        }
        if let Some((name, value)) = get("MAX_BATCHES") {
            config.max_batches = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = get("TIME_BUDGET_SECS") {
            config.time_budget_secs = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = get("SAFETY_MARGIN_SECS") {
            config.safety_margin_secs = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = get("CONTINUATION_DELAY_SECS") {
            config.continuation_delay_secs = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = get("CHECKPOINT_STEP_INTERVAL") {
            config.checkpoint_step_interval = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = get("CHECKPOINT_TIME_INTERVAL_SECS") {
            config.checkpoint_time_interval_secs = parse_number(&name, &value)?;
        }
        if let Some((name, value)) = get("MAX_STEPS") {
            config.max_steps = parse_number(&name, &value)?;
        }
        if let Some((_, value)) = get("SUMMARY_CHANNEL") {
            config.summary_channel = Some(value.trim().to_owned());
        }
        if let Some((_, value)) = get("DIGEST_RECIPIENTS") {
            config.digest_recipients = value
                .split(',')
                .map(str::trim)
                .filter(|recipient| !recipient.is_empty())
                .map(str::to_owned)
                .collect();
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
            expected: "a non-negative integer",
        })
}
