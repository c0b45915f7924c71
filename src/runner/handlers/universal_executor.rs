//! `agent_universal_executor`: a resumable multi-step agent run.

use super::UNIVERSAL_EXECUTOR;
use crate::checkpoint::{
    domain::{CheckpointDraft, CheckpointPolicy, ResumeState, SaveCheckpoint},
    services::CheckpointStore,
};
use crate::event::ports::EventLogRepository;
use crate::job::domain::JobType;
use crate::runner::{
    domain::{JobContext, JobOutcome, Payload},
    ports::{HandlerError, JobHandler, StepExecutor, StepRequest},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

const RFP_IDS_KEY: &str = "rfpIds";

/// Progress carried between steps and across attempts.
#[derive(Debug, Clone, Default)]
struct Progress {
    step: u64,
    state: Map<String, Value>,
    tool_calls: Vec<Value>,
    results: Map<String, Value>,
}

impl Progress {
    fn fresh(rfp_ids: &[String]) -> Self {
        let mut state = Map::new();
        state.insert(RFP_IDS_KEY.to_owned(), json!(rfp_ids));
        Self {
            state,
            ..Self::default()
        }
    }

    fn resumed(resume: &ResumeState) -> Self {
        Self {
            step: resume.step,
            state: resume.checkpoint_data.clone(),
            tool_calls: resume.tool_calls.clone(),
            results: resume.intermediate_results.clone(),
        }
    }

    fn draft(&self) -> CheckpointDraft {
        CheckpointDraft::new(self.step, self.state.clone())
            .with_tool_calls(self.tool_calls.clone())
            .with_intermediate_results(self.results.clone())
    }
}

/// Drives a [`StepExecutor`] one step at a time.
///
/// Progress is checkpointed whenever the [`CheckpointPolicy`] fires. When
/// the pass budget runs low the handler suspends and the runner continues
/// it in a fresh job; a failing step is recoverable from the last progress.
/// Runs that exceed `max_steps` fail.
///
/// Payload: `{rfpIds}`.
pub struct UniversalExecutorHandler<E, C>
where
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    executor: Arc<dyn StepExecutor>,
    checkpoints: CheckpointStore<E, C>,
    policy: CheckpointPolicy,
    max_steps: u64,
}

impl<E, C> UniversalExecutorHandler<E, C>
where
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates the handler.
    #[must_use]
    pub const fn new(
        executor: Arc<dyn StepExecutor>,
        events: Arc<E>,
        clock: Arc<C>,
        policy: CheckpointPolicy,
        max_steps: u64,
    ) -> Self {
        Self {
            executor,
            checkpoints: CheckpointStore::new(events, clock),
            policy,
            max_steps,
        }
    }

    fn starting_progress(context: &JobContext, rfp_ids: &[String]) -> Progress {
        let Some(resume) = context.resume() else {
            return Progress::fresh(rfp_ids);
        };
        match resume.validate(&[RFP_IDS_KEY]) {
            Ok(()) => {
                info!(
                    job_id = %context.job().id(),
                    step = resume.step,
                    checkpoint_id = %resume.checkpoint_id,
                    "resuming from checkpoint"
                );
                Progress::resumed(resume)
            }
            Err(err) => {
                warn!(job_id = %context.job().id(), error = %err, "checkpoint unusable; starting over");
                Progress::fresh(rfp_ids)
            }
        }
    }

    async fn save_periodic(&self, context: &JobContext, progress: &Progress) -> bool {
        let job = context.job();
        let saved = self
            .checkpoints
            .save(SaveCheckpoint {
                scope_id: job.scope_id(),
                job_id: Some(job.id()),
                draft: progress.draft(),
            })
            .await;
        match saved {
            Ok(record) => {
                debug!(job_id = %job.id(), step = progress.step, checkpoint_id = %record.id, "progress checkpointed");
                true
            }
            Err(err) => {
                warn!(job_id = %job.id(), error = %err, "periodic checkpoint failed");
                false
            }
        }
    }
}

#[async_trait]
impl<E, C> JobHandler for UniversalExecutorHandler<E, C>
where
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    fn job_type(&self) -> JobType {
        JobType::from_static(UNIVERSAL_EXECUTOR)
    }

    fn is_resumable(&self) -> bool {
        true
    }

    async fn handle(&self, context: &JobContext) -> Result<JobOutcome, HandlerError> {
        let payload = Payload::new(context.job().payload())?;
        let rfp_ids = payload.string_list(RFP_IDS_KEY)?;
        let mut progress = Self::starting_progress(context, &rfp_ids);
        let mut last_checkpoint_step = progress.step;
        let mut last_checkpoint_at: Option<DateTime<Utc>> =
            context.resume().map(|resume| resume.checkpoint_created_at);

        loop {
            if progress.step >= self.max_steps {
                return Ok(JobOutcome::fatal(format!(
                    "max_steps_exceeded:{}",
                    self.max_steps
                )));
            }
            if context.budget().should_yield() {
                return Ok(JobOutcome::Suspended(progress.draft()));
            }

            let request = StepRequest {
                step: progress.step,
                rfp_ids: &rfp_ids,
                state: &progress.state,
            };
            let outcome = match self.executor.execute_step(request).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    return Ok(JobOutcome::Recoverable {
                        error: err.to_string(),
                        checkpoint: Some(progress.draft()),
                    });
                }
            };

            progress.step = progress.step.saturating_add(1);
            progress.state.extend(outcome.state_updates);
            progress.tool_calls.extend(outcome.tool_calls);
            progress
                .results
                .insert(format!("step{}", progress.step), outcome.output);

            if outcome.done {
                return Ok(JobOutcome::completed(json!({
                    "steps": progress.step,
                    "results": progress.results,
                })));
            }

            let now = context.now();
            if self.policy.should_checkpoint(
                progress.step,
                last_checkpoint_step,
                last_checkpoint_at,
                now,
            ) && self.save_periodic(context, &progress).await
            {
                last_checkpoint_step = progress.step;
                last_checkpoint_at = Some(now);
            }
        }
    }
}
