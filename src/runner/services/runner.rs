//! The drain loop: claim due jobs, dispatch them, and settle each outcome.

use super::{HandlerRegistry, render_summary};
use crate::checkpoint::{
    domain::{CheckpointDraft, ResumeState, SaveCheckpoint},
    services::{CheckpointStore, CheckpointStoreError},
};
use crate::config::RunnerConfig;
use crate::event::{
    domain::{EventType, NewEvent, ScopeId},
    ports::EventLogRepository,
    services::EventLogService,
};
use crate::job::{
    domain::{DuePosition, Job, timestamp::after, truncate_error},
    ports::JobRepository,
    services::{CreateJobRequest, JobQueueError, JobQueueService},
};
use crate::notify::ports::{ChatMessage, ChatNotifier};
use crate::runner::{
    domain::{Completion, Disposition, FollowUp, JobContext, JobOutcome, RunSummary, TimeBudget},
    ports::{HandlerError, JobHandler},
};
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Actor recorded on events and jobs created by the runner.
pub const RUNNER_ACTOR: &str = "job_runner";

/// Errors that abort a runner pass or a continuation.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The job queue failed.
    #[error(transparent)]
    Queue(#[from] JobQueueError),
    /// The checkpoint store failed.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointStoreError),
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Drains due jobs through their registered handlers.
///
/// A pass claims batches until none are due, dispatches each job under a
/// shared time budget, and records the outcome: completion, a checkpoint
/// plus continuation job, or a failure with a `job_failed` event. Handler
/// errors never escape a pass.
pub struct JobRunner<J, E, C>
where
    J: JobRepository,
    E: EventLogRepository,
    C: Clock + Send + Sync + 'static,
{
    jobs: JobQueueService<J, C>,
    events: EventLogService<E, C>,
    checkpoints: CheckpointStore<E, C>,
    registry: HandlerRegistry,
    chat: Arc<dyn ChatNotifier>,
    config: RunnerConfig,
    clock: Arc<C>,
}

impl<J, E, C> JobRunner<J, E, C>
where
    J: JobRepository,
    E: EventLogRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a runner over the given stores.
    #[must_use]
    pub fn new(
        jobs: Arc<J>,
        events: Arc<E>,
        clock: Arc<C>,
        registry: HandlerRegistry,
        chat: Arc<dyn ChatNotifier>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            jobs: JobQueueService::new(jobs, Arc::clone(&clock)),
            events: EventLogService::new(Arc::clone(&events), Arc::clone(&clock)),
            checkpoints: CheckpointStore::new(events, Arc::clone(&clock)),
            registry,
            chat,
            config,
            clock,
        }
    }

    /// Returns the runner configuration.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs one pass and returns its summary.
    ///
    /// Jobs whose dependencies are pending, or that another runner claimed
    /// first, are left behind: later batches of the same pass read the due
    /// index past the furthest such job, so any number of blocked jobs
    /// never hides a ready one due after them.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Queue`] only when claiming a batch fails;
    /// per-job failures are recorded on the jobs and in the summary.
    pub async fn run_once(&self) -> RunnerResult<RunSummary> {
        let clock: Arc<dyn Clock + Send + Sync> = Arc::<C>::clone(&self.clock);
        let budget = TimeBudget::start(
            clock,
            self.config.time_budget(),
            self.config.safety_margin(),
        );
        let mut summary = RunSummary::starting(budget.started_at());
        let mut resume_after: Option<DuePosition> = None;
        debug!(batch_limit = self.config.batch_limit, "runner pass started");

        loop {
            if summary.batches >= self.config.max_batches {
                warn!(batches = summary.batches, "batch ceiling reached; ending pass");
                break;
            }
            if budget.should_yield() {
                info!("time budget nearly spent; leaving remaining jobs for the next pass");
                break;
            }
            let batch = self
                .jobs
                .claim_due_after(resume_after, self.config.batch_limit)
                .await?;
            if batch.is_empty() {
                break;
            }
            summary.batches += 1;
            for job in batch {
                let position = job.due_position();
                if !self.process(job, &budget, &mut summary).await {
                    resume_after = resume_after.max(Some(position));
                }
            }
        }

        summary.finished_at = self.clock.utc();
        self.report(&summary).await;
        info!(
            batches = summary.batches,
            attempted = summary.attempted,
            completed = summary.completed,
            failed = summary.failed,
            checkpointed = summary.checkpointed,
            skipped = summary.skipped,
            "runner pass finished"
        );
        Ok(summary)
    }

    /// Returns `false` when the job was left queued.
    async fn process(&self, job: Job, budget: &TimeBudget, summary: &mut RunSummary) -> bool {
        let job_id = job.id();
        match self.jobs.dependencies_met(&job).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(job_id = %job_id, "dependencies pending; job stays queued");
                summary.skipped += 1;
                return false;
            }
            Err(err) => {
                warn!(job_id = %job_id, error = %err, "dependency check failed; job stays queued");
                summary.skipped += 1;
                return false;
            }
        }

        let claimed = match self.jobs.try_mark_running(job_id).await {
            Ok(Some(claimed)) => claimed,
            Ok(None) => {
                debug!(job_id = %job_id, "job claimed by another runner");
                summary.skipped += 1;
                return false;
            }
            Err(err) => {
                warn!(job_id = %job_id, error = %err, "claim failed");
                summary.skipped += 1;
                return false;
            }
        };

        summary.attempted += 1;
        let disposition = self.dispatch(claimed, budget).await;
        summary.record(disposition);
        true
    }

    async fn dispatch(&self, job: Job, budget: &TimeBudget) -> Disposition {
        let Some(handler) = self.registry.get(job.job_type()) else {
            let message = format!("unknown_job_type:{}", job.job_type());
            return self.fail_job(&job, &message).await;
        };
        debug!(job_id = %job.id(), job_type = %job.job_type(), "dispatching job");

        let resume = self.load_resume_state(&job).await;
        let context = JobContext::new(job, resume, budget.clone());
        let outcome = handler
            .handle(&context)
            .await
            .unwrap_or_else(HandlerError::into_outcome);
        self.settle(handler.as_ref(), &context, outcome).await
    }

    async fn settle(
        &self,
        handler: &dyn JobHandler,
        context: &JobContext,
        outcome: JobOutcome,
    ) -> Disposition {
        let job = context.job();
        match outcome {
            JobOutcome::Completed(completion) => self.complete_job(job, completion).await,
            JobOutcome::Suspended(draft) => self.continue_or_fail(job, draft).await,
            JobOutcome::Recoverable { error, checkpoint } => {
                let draft = checkpoint.or_else(|| {
                    handler.is_resumable().then(|| {
                        context
                            .resume()
                            .map_or_else(CheckpointDraft::default, ResumeState::to_draft)
                    })
                });
                match draft {
                    Some(progress) => {
                        warn!(
                            job_id = %job.id(),
                            error = %error,
                            "recoverable failure; checkpointing for a retry"
                        );
                        self.continue_or_fail(job, progress.with_metadata("lastError", json!(error)))
                            .await
                    }
                    None => self.fail_job(job, &error).await,
                }
            }
            JobOutcome::Fatal(error) => self.fail_job(job, &error).await,
        }
    }

    async fn complete_job(&self, job: &Job, completion: Completion) -> Disposition {
        let Completion { result, follow_up } = completion;
        if let Err(err) = self.jobs.complete(job.id(), result).await {
            error!(job_id = %job.id(), error = %err, "failed to record completion");
            return Disposition::Failed;
        }
        if let Some(next) = follow_up {
            match self.schedule_follow_up(job, next).await {
                Ok(scheduled) => debug!(
                    job_id = %job.id(),
                    follow_up_id = %scheduled.id(),
                    due_at = %scheduled.due_at(),
                    "follow-up job scheduled"
                ),
                Err(err) => warn!(job_id = %job.id(), error = %err, "failed to schedule follow-up job"),
            }
        }
        Disposition::Completed
    }

    async fn continue_or_fail(&self, job: &Job, draft: CheckpointDraft) -> Disposition {
        match self.checkpoint_and_continue(job, draft).await {
            Ok(continuation) => {
                info!(
                    job_id = %job.id(),
                    continuation_id = %continuation.id(),
                    due_at = %continuation.due_at(),
                    "job checkpointed; continuation queued"
                );
                Disposition::Checkpointed
            }
            Err(err) => self.fail_job(job, &format!("checkpoint_failed: {err}")).await,
        }
    }

    async fn checkpoint_and_continue(
        &self,
        job: &Job,
        draft: CheckpointDraft,
    ) -> RunnerResult<Job> {
        let record = self
            .checkpoints
            .save(SaveCheckpoint {
                scope_id: job.scope_id(),
                job_id: Some(job.id()),
                draft,
            })
            .await?;
        self.jobs.mark_checkpointed(job.id(), record.id).await?;

        let due_at = after(self.clock.utc(), self.config.continuation_delay());
        let request = inherit_requester(
            CreateJobRequest::new(job.job_type().as_str())
                .with_scope(job.scope().clone())
                .with_payload(job.payload().clone())
                .with_due_at(due_at)
                .with_depends_on(job.depends_on().iter().copied())
                .with_resume_from(record.id),
            job,
        );
        Ok(self.jobs.create(request).await?)
    }

    async fn schedule_follow_up(&self, job: &Job, follow_up: FollowUp) -> RunnerResult<Job> {
        let FollowUp {
            job_type,
            payload,
            delay,
        } = follow_up;
        let next_type = job_type.unwrap_or_else(|| job.job_type().clone());
        let request = inherit_requester(
            CreateJobRequest::new(next_type.as_str())
                .with_scope(job.scope().clone())
                .with_payload(payload)
                .with_due_at(after(self.clock.utc(), delay)),
            job,
        );
        Ok(self.jobs.create(request).await?)
    }

    async fn fail_job(&self, job: &Job, message: &str) -> Disposition {
        warn!(job_id = %job.id(), job_type = %job.job_type(), error = %message, "job failed");
        if let Err(err) = self.jobs.fail(job.id(), message).await {
            error!(job_id = %job.id(), error = %err, "failed to record job failure");
        }

        let event = NewEvent::new(
            job.scope_id(),
            EventType::from_static(EventType::JOB_FAILED),
            json!({
                "jobId": job.id().to_string(),
                "jobType": job.job_type().as_str(),
                "error": truncate_error(message),
            }),
        )
        .with_created_by(RUNNER_ACTOR);
        if let Err(err) = self.events.append(event).await {
            warn!(job_id = %job.id(), error = %err, "failed to record job_failed event");
        }
        Disposition::Failed
    }

    async fn load_resume_state(&self, job: &Job) -> Option<ResumeState> {
        let checkpoint_id = job.resume_from()?;
        match self.checkpoints.find(checkpoint_id).await {
            Ok(Some(record)) => Some(record.into_resume_state()),
            Ok(None) => {
                warn!(job_id = %job.id(), checkpoint_id = %checkpoint_id, "resume checkpoint missing; starting fresh");
                None
            }
            Err(err) => {
                warn!(job_id = %job.id(), checkpoint_id = %checkpoint_id, error = %err, "resume checkpoint unreadable; starting fresh");
                None
            }
        }
    }

    async fn report(&self, summary: &RunSummary) {
        match serde_json::to_value(summary) {
            Ok(payload) => {
                let event = NewEvent::new(
                    ScopeId::global(),
                    EventType::from_static(EventType::RUNNER_SUMMARY),
                    payload,
                )
                .with_created_by(RUNNER_ACTOR);
                if let Err(err) = self.events.append(event).await {
                    warn!(error = %err, "failed to record runner summary");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode runner summary"),
        }

        if summary.attempted == 0 {
            return;
        }
        let Some(channel) = self.config.summary_channel.as_deref() else {
            return;
        };
        let text = match render_summary(summary) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "failed to render runner summary");
                return;
            }
        };
        match self.chat.post_message(&ChatMessage::new(channel, text)).await {
            Ok(delivery) if delivery.ok => debug!(channel, "runner summary posted"),
            Ok(_) => warn!(channel, "runner summary not delivered"),
            Err(err) => warn!(channel, error = %err, "failed to post runner summary"),
        }
    }
}

fn inherit_requester(request: CreateJobRequest, job: &Job) -> CreateJobRequest {
    match job.requested_by() {
        Some(requested_by) => request.with_requested_by(requested_by),
        None => request,
    }
}
