//! `ecs_rollout_verify`: wait for a service deployment to settle.

use super::{ECS_ROLLOUT_VERIFY, post_best_effort};
use crate::job::domain::JobType;
use crate::notify::ports::ChatNotifier;
use crate::runner::{
    domain::{JobContext, JobOutcome, Payload, PayloadError},
    ports::{DeploymentInspector, DeploymentTarget, HandlerError, JobHandler, RolloutState},
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Poll interval used when the payload gives none.
pub const DEFAULT_POLL_SECONDS: u64 = 10;
/// Timeout used when the payload gives none.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;
/// Hard ceiling on the timeout, whatever the payload asks for.
pub const MAX_TIMEOUT_SECONDS: u64 = 3600;

/// Polls the deployment inspector every `pollSeconds` until the rollout
/// completes, fails, or `timeoutSeconds` pass. Inspector errors count as
/// a poll that saw no progress.
///
/// Payload: `{timeoutSeconds?, pollSeconds?, channelId?, threadTs?,
/// cluster?, service?}`; the cluster and service fall back to the
/// handler's default target.
pub struct RolloutVerifyHandler {
    inspector: Arc<dyn DeploymentInspector>,
    chat: Arc<dyn ChatNotifier>,
    default_target: Option<DeploymentTarget>,
}

impl RolloutVerifyHandler {
    /// Creates the handler.
    #[must_use]
    pub const fn new(inspector: Arc<dyn DeploymentInspector>, chat: Arc<dyn ChatNotifier>) -> Self {
        Self {
            inspector,
            chat,
            default_target: None,
        }
    }

    /// Sets the target used when the payload names none.
    #[must_use]
    pub fn with_default_target(mut self, target: DeploymentTarget) -> Self {
        self.default_target = Some(target);
        self
    }

    fn target(&self, payload: &Payload<'_>) -> Result<DeploymentTarget, HandlerError> {
        let fallback = self.default_target.as_ref();
        let cluster = payload
            .optional_str("cluster")?
            .or_else(|| fallback.map(|target| target.cluster.as_str()));
        let service = payload
            .optional_str("service")?
            .or_else(|| fallback.map(|target| target.service.as_str()));
        Ok(DeploymentTarget {
            cluster: cluster
                .ok_or(PayloadError::MissingField("cluster"))?
                .to_owned(),
            service: service
                .ok_or(PayloadError::MissingField("service"))?
                .to_owned(),
        })
    }

    async fn poll(
        &self,
        target: &DeploymentTarget,
        timeout: Duration,
        interval: Duration,
    ) -> (RolloutState, u64) {
        let deadline = Instant::now() + timeout;
        let mut polls = 0_u64;
        loop {
            polls = polls.saturating_add(1);
            match self.inspector.rollout_state(target).await {
                Ok(RolloutState::InProgress) => {
                    debug!(cluster = %target.cluster, service = %target.service, polls, "rollout in progress");
                }
                Ok(settled) => return (settled, polls),
                Err(err) => {
                    warn!(cluster = %target.cluster, service = %target.service, error = %err, "rollout state unavailable");
                }
            }
            if Instant::now() + interval > deadline {
                return (RolloutState::InProgress, polls);
            }
            sleep(interval).await;
        }
    }
}

#[async_trait]
impl JobHandler for RolloutVerifyHandler {
    fn job_type(&self) -> JobType {
        JobType::from_static(ECS_ROLLOUT_VERIFY)
    }

    async fn handle(&self, context: &JobContext) -> Result<JobOutcome, HandlerError> {
        let job = context.job();
        let payload = Payload::new(job.payload())?;
        let timeout_seconds = payload
            .u64_or("timeoutSeconds", DEFAULT_TIMEOUT_SECONDS)?
            .min(MAX_TIMEOUT_SECONDS);
        let poll_seconds = payload.u64_or("pollSeconds", DEFAULT_POLL_SECONDS)?.max(1);
        let channel = payload.optional_str("channelId")?;
        let thread_ts = payload.optional_str("threadTs")?;
        let target = self.target(&payload)?;

        let (state, polls) = self
            .poll(
                &target,
                Duration::from_secs(timeout_seconds),
                Duration::from_secs(poll_seconds),
            )
            .await;
        let service = format!("{}/{}", target.cluster, target.service);
        let result = json!({ "cluster": target.cluster, "service": target.service, "polls": polls });
        match state {
            RolloutState::Completed => {
                info!(job_id = %job.id(), service = %service, polls, "rollout completed");
                post_best_effort(
                    self.chat.as_ref(),
                    channel,
                    thread_ts,
                    format!("Rollout of {service} completed."),
                )
                .await;
                Ok(JobOutcome::completed(result))
            }
            RolloutState::Failed(reason) => {
                post_best_effort(
                    self.chat.as_ref(),
                    channel,
                    thread_ts,
                    format!("Rollout of {service} failed: {reason}"),
                )
                .await;
                Ok(JobOutcome::fatal(format!("rollout_failed:{reason}")))
            }
            RolloutState::InProgress => {
                post_best_effort(
                    self.chat.as_ref(),
                    channel,
                    thread_ts,
                    format!("Rollout of {service} did not settle within {timeout_seconds}s."),
                )
                .await;
                Ok(JobOutcome::fatal(format!("rollout_timeout:{timeout_seconds}s")))
            }
        }
    }
}
