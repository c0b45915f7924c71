//! `change_proposal_open_pr`: open a pull request for an approved change
//! proposal and start polling its checks.

use super::{CHANGE_PROPOSAL_OPEN_PR, GITHUB_PR_CHECKS, post_best_effort};
use crate::job::domain::{JobType, timestamp::minutes};
use crate::notify::ports::ChatNotifier;
use crate::runner::{
    domain::{Completion, FollowUp, JobContext, JobOutcome, Payload},
    ports::{ChangeProposal, HandlerError, JobHandler, PullRequestHost},
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

const FIRST_CHECKS_POLL_MINUTES: u64 = 2;

/// Opens the pull request, reports it in the originating thread, and
/// schedules a `github_pr_checks` job two minutes later.
///
/// Payload: `{proposalId, _actorSlackUserId?, channelId?, threadTs?, rfpId?}`.
pub struct ChangeProposalHandler {
    host: Arc<dyn PullRequestHost>,
    chat: Arc<dyn ChatNotifier>,
}

impl ChangeProposalHandler {
    /// Creates the handler.
    #[must_use]
    pub const fn new(host: Arc<dyn PullRequestHost>, chat: Arc<dyn ChatNotifier>) -> Self {
        Self { host, chat }
    }
}

#[async_trait]
impl JobHandler for ChangeProposalHandler {
    fn job_type(&self) -> JobType {
        JobType::from_static(CHANGE_PROPOSAL_OPEN_PR)
    }

    async fn handle(&self, context: &JobContext) -> Result<JobOutcome, HandlerError> {
        let job = context.job();
        let payload = Payload::new(job.payload())?;
        let proposal = ChangeProposal {
            proposal_id: payload.required_str("proposalId")?.to_owned(),
            rfp_id: payload.optional_id("rfpId")?,
            actor: payload.optional_str("_actorSlackUserId")?.map(str::to_owned),
        };
        let channel = payload.optional_str("channelId")?;
        let thread_ts = payload.optional_str("threadTs")?;

        let pull_request = self.host.open_change_proposal(&proposal).await?;
        info!(
            job_id = %job.id(),
            proposal_id = %proposal.proposal_id,
            url = %pull_request.url,
            "change proposal pull request opened"
        );

        let mention = proposal
            .actor
            .as_deref()
            .map(|actor| format!("<@{actor}> "))
            .unwrap_or_default();
        post_best_effort(
            self.chat.as_ref(),
            channel,
            thread_ts,
            format!("{mention}Opened a pull request for proposal {}: {}", proposal.proposal_id, pull_request.url),
        )
        .await;

        let checks_payload = json!({
            "prUrl": pull_request.url,
            "prNumber": pull_request.number,
            "proposalId": proposal.proposal_id,
            "channelId": channel,
            "threadTs": thread_ts,
        });
        let result = json!({
            "proposalId": proposal.proposal_id,
            "prUrl": pull_request.url,
            "prNumber": pull_request.number,
        });
        Ok(Completion::new(result)
            .then(FollowUp::of_type(
                JobType::from_static(GITHUB_PR_CHECKS),
                checks_payload,
                minutes(FIRST_CHECKS_POLL_MINUTES),
            ))
            .into())
    }
}
