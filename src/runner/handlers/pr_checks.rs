//! `github_pr_checks`: poll a pull request's checks until they resolve.

use super::{GITHUB_PR_CHECKS, post_best_effort};
use crate::job::domain::{JobType, timestamp::minutes};
use crate::notify::ports::ChatNotifier;
use crate::runner::{
    domain::{Completion, FollowUp, JobContext, JobOutcome, Payload, PayloadError},
    ports::{ChecksState, HandlerError, JobHandler, PullRequestHost},
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info};

/// Polls made before the handler stops waiting on pending checks.
pub const MAX_POLL_ATTEMPTS: u64 = 30;

const POLL_ATTEMPT_KEY: &str = "_pollAttempt";
const POLL_INTERVAL_MINUTES: u64 = 2;

/// Reads check results once per job. Pending checks complete the job and
/// enqueue the next poll with `_pollAttempt` incremented; resolved checks
/// post the verdict to the thread.
///
/// Payload: `{pr | prUrl | prNumber, channelId?, threadTs?, _pollAttempt?}`.
pub struct PrChecksHandler {
    host: Arc<dyn PullRequestHost>,
    chat: Arc<dyn ChatNotifier>,
}

impl PrChecksHandler {
    /// Creates the handler.
    #[must_use]
    pub const fn new(host: Arc<dyn PullRequestHost>, chat: Arc<dyn ChatNotifier>) -> Self {
        Self { host, chat }
    }
}

#[async_trait]
impl JobHandler for PrChecksHandler {
    fn job_type(&self) -> JobType {
        JobType::from_static(GITHUB_PR_CHECKS)
    }

    async fn handle(&self, context: &JobContext) -> Result<JobOutcome, HandlerError> {
        let job = context.job();
        let payload = Payload::new(job.payload())?;
        let pull_request = pull_request_ref(&payload)?;
        let attempt = payload.u64_or(POLL_ATTEMPT_KEY, 0)?;
        let channel = payload.optional_str("channelId")?;
        let thread_ts = payload.optional_str("threadTs")?;

        let report = self.host.checks(&pull_request).await?;
        let verdict = match report.state {
            ChecksState::Pending => {
                let next_attempt = attempt.saturating_add(1);
                if next_attempt < MAX_POLL_ATTEMPTS {
                    debug!(job_id = %job.id(), pr = %pull_request, attempt = next_attempt, "checks pending; polling again");
                    let result = json!({ "pr": pull_request, "state": "pending", "attempt": attempt });
                    return Ok(Completion::new(result)
                        .then(FollowUp::same_type(
                            with_poll_attempt(job.payload(), next_attempt),
                            minutes(POLL_INTERVAL_MINUTES),
                        ))
                        .into());
                }
                format!("Checks on {pull_request} are still pending after {next_attempt} polls; no longer waiting.")
            }
            ChecksState::Passing => {
                format!("All {} checks passed on {pull_request}.", report.total)
            }
            ChecksState::Failing => format!(
                "{} of {} checks failed on {pull_request}: {}",
                report.failing.len(),
                report.total,
                report.failing.join(", ")
            ),
        };

        info!(job_id = %job.id(), pr = %pull_request, state = ?report.state, "pull request checks resolved");
        post_best_effort(self.chat.as_ref(), channel, thread_ts, verdict).await;
        Ok(JobOutcome::completed(json!({
            "pr": pull_request,
            "state": state_label(report.state),
            "failing": report.failing,
            "total": report.total,
            "attempt": attempt,
        })))
    }
}

fn pull_request_ref(payload: &Payload<'_>) -> Result<String, PayloadError> {
    if let Some(reference) = payload.optional_id("pr")? {
        return Ok(reference);
    }
    if let Some(url) = payload.optional_str("prUrl")? {
        return Ok(url.to_owned());
    }
    payload
        .optional_id("prNumber")?
        .ok_or(PayloadError::MissingField("pr"))
}

fn with_poll_attempt(payload: &Value, attempt: u64) -> Value {
    let mut fields = payload.as_object().cloned().unwrap_or_else(Map::new);
    fields.insert(POLL_ATTEMPT_KEY.to_owned(), json!(attempt));
    Value::Object(fields)
}

const fn state_label(state: ChecksState) -> &'static str {
    match state {
        ChecksState::Pending => "pending",
        ChecksState::Passing => "passing",
        ChecksState::Failing => "failing",
    }
}
