//! [`PullRequestHost`] backed by the GitHub CLI (`gh`).

use super::command::{capture, failed};
use crate::runner::ports::{
    ChangeProposal, ChecksReport, ChecksState, CollaboratorError, CollaboratorResult,
    PullRequestHost, PullRequestRef,
};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

const PROGRAM: &str = "gh";

/// Opens pull requests and reads checks through `gh`.
///
/// Proposal branches are named `<branch_prefix><proposalId>` and must
/// already be pushed.
#[derive(Debug, Clone)]
pub struct GhCliHost {
    repository: Option<String>,
    base_branch: String,
    branch_prefix: String,
}

impl Default for GhCliHost {
    fn default() -> Self {
        Self {
            repository: None,
            base_branch: "main".to_owned(),
            branch_prefix: "proposal/".to_owned(),
        }
    }
}

impl GhCliHost {
    /// Creates a host that targets the repository of the working
    /// directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets `owner/name` explicitly.
    #[must_use]
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    /// Sets the branch pull requests merge into.
    #[must_use]
    pub fn with_base_branch(mut self, base_branch: impl Into<String>) -> Self {
        self.base_branch = base_branch.into();
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(PROGRAM);
        command.args(args);
        if let Some(repository) = &self.repository {
            command.arg("--repo").arg(repository);
        }
        command
    }
}

#[async_trait]
impl PullRequestHost for GhCliHost {
    async fn open_change_proposal(
        &self,
        proposal: &ChangeProposal,
    ) -> CollaboratorResult<PullRequestRef> {
        let head = format!("{}{}", self.branch_prefix, proposal.proposal_id);
        let title = format!("Change proposal {}", proposal.proposal_id);
        let body = match (&proposal.rfp_id, &proposal.actor) {
            (Some(rfp_id), Some(actor)) => {
                format!("Requested by {actor} for RFP {rfp_id}.")
            }
            (Some(rfp_id), None) => format!("Change proposal for RFP {rfp_id}."),
            (None, Some(actor)) => format!("Requested by {actor}."),
            (None, None) => "Automated change proposal.".to_owned(),
        };

        let mut command = self.command(&[
            "pr",
            "create",
            "--head",
            &head,
            "--base",
            &self.base_branch,
            "--title",
            &title,
            "--body",
            &body,
        ]);
        let output = capture(PROGRAM, &mut command).await?;
        if !output.status.success() {
            return Err(failed(PROGRAM, &output));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .map(str::trim)
            .rfind(|line| line.starts_with("https://"))
            .map(pull_request_from_url)
            .ok_or_else(|| CollaboratorError::Malformed {
                source_name: PROGRAM.to_owned(),
                reason: "pr create printed no pull request URL".to_owned(),
            })
    }

    async fn checks(&self, pull_request: &str) -> CollaboratorResult<ChecksReport> {
        let mut command = self.command(&["pr", "checks", pull_request, "--json", "name,bucket"]);
        let output = capture(PROGRAM, &mut command).await?;
        // `gh pr checks` exits non-zero while checks are pending or failing
        // but still prints the JSON.
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(failed(PROGRAM, &output));
        }
        parse_checks(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct CheckRun {
    name: String,
    bucket: String,
}

/// Folds `gh pr checks --json name,bucket` output into a report.
pub(crate) fn parse_checks(json: &str) -> CollaboratorResult<ChecksReport> {
    let runs: Vec<CheckRun> =
        serde_json::from_str(json).map_err(|err| CollaboratorError::Malformed {
            source_name: PROGRAM.to_owned(),
            reason: err.to_string(),
        })?;
    let failing: Vec<String> = runs
        .iter()
        .filter(|run| matches!(run.bucket.as_str(), "fail" | "cancel"))
        .map(|run| run.name.clone())
        .collect();
    let pending = runs.iter().any(|run| run.bucket == "pending");
    let state = if pending {
        ChecksState::Pending
    } else if failing.is_empty() {
        ChecksState::Passing
    } else {
        ChecksState::Failing
    };
    Ok(ChecksReport {
        state,
        failing,
        total: runs.len(),
    })
}

/// Reads the pull request number from the last path segment of its URL.
pub(crate) fn pull_request_from_url(url: &str) -> PullRequestRef {
    let number = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u64>().ok());
    PullRequestRef {
        number,
        url: url.to_owned(),
    }
}
