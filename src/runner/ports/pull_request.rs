//! Source-control host operations used by the change-proposal handlers.

use super::CollaboratorResult;
use async_trait::async_trait;

/// A change proposal to open as a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeProposal {
    /// Proposal identifier; the branch is derived from it.
    pub proposal_id: String,
    /// RFP the proposal belongs to.
    pub rfp_id: Option<String>,
    /// Chat user who asked for the change.
    pub actor: Option<String>,
}

/// A pull request on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Pull request number.
    pub number: Option<u64>,
    /// Web URL.
    pub url: String,
}

/// Aggregate state of a pull request's checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksState {
    /// Some checks are still running.
    Pending,
    /// Every check passed or was skipped.
    Passing,
    /// At least one check failed.
    Failing,
}

/// Check results for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksReport {
    /// Aggregate state.
    pub state: ChecksState,
    /// Names of failing checks.
    pub failing: Vec<String>,
    /// Total number of checks.
    pub total: usize,
}

/// Pull request operations on the source-control host.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Opens a pull request for a change proposal.
    async fn open_change_proposal(
        &self,
        proposal: &ChangeProposal,
    ) -> CollaboratorResult<PullRequestRef>;

    /// Reads check results for a pull request given by number or URL.
    async fn checks(&self, pull_request: &str) -> CollaboratorResult<ChecksReport>;
}
