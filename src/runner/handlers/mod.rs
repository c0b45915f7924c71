//! Built-in job handlers.
//!
//! Producers outside this crate construct payloads for these job types by
//! hand, so the type tags and payload field names are part of the external
//! contract and must not change.

mod change_proposal;
mod digest;
mod pr_checks;
mod rollout;
mod slack_notification;
mod state_refresh;
mod universal_executor;

pub use change_proposal::ChangeProposalHandler;
pub use digest::DailyDigestHandler;
pub use pr_checks::{MAX_POLL_ATTEMPTS, PrChecksHandler};
pub use rollout::{
    DEFAULT_POLL_SECONDS, DEFAULT_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS, RolloutVerifyHandler,
};
pub use slack_notification::SlackNotificationHandler;
pub use state_refresh::StateRefreshHandler;
pub use universal_executor::UniversalExecutorHandler;

use crate::notify::ports::{ChatMessage, ChatNotifier};
use tracing::warn;

/// Daily digest email that reschedules itself.
pub const DAILY_DIGEST: &str = "agent_daily_digest";
/// Periodic aggregate of recent job outcomes.
pub const STATE_REFRESH: &str = "agent_state_refresh";
/// Multi-step agent execution with checkpoint and resume.
pub const UNIVERSAL_EXECUTOR: &str = "agent_universal_executor";
/// One chat message.
pub const SLACK_NOTIFICATION: &str = "slack_notification";
/// Opens a pull request for a change proposal.
pub const CHANGE_PROPOSAL_OPEN_PR: &str = "change_proposal_open_pr";
/// Polls pull request checks.
pub const GITHUB_PR_CHECKS: &str = "github_pr_checks";
/// Waits for a container service rollout to settle.
pub const ECS_ROLLOUT_VERIFY: &str = "ecs_rollout_verify";

/// Posts a thread reply when the payload named a channel. Failures are
/// logged and ignored.
async fn post_best_effort(
    chat: &dyn ChatNotifier,
    channel: Option<&str>,
    thread_ts: Option<&str>,
    text: String,
) {
    let Some(target) = channel else {
        return;
    };
    let message = ChatMessage::new(target, text).in_thread(thread_ts.map(str::to_owned));
    match chat.post_message(&message).await {
        Ok(delivery) if delivery.ok => {}
        Ok(_) => warn!(channel = target, "chat message not delivered"),
        Err(err) => warn!(channel = target, error = %err, "chat message failed"),
    }
}
