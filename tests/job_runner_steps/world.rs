//! Shared world state for job runner BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use crate::test_helpers::ManualClock;
use async_trait::async_trait;
use bidforge::checkpoint::domain::CheckpointPolicy;
use bidforge::config::RunnerConfig;
use bidforge::event::{adapters::memory::InMemoryEventLog, services::EventLogService};
use bidforge::job::{
    adapters::memory::InMemoryJobRepository,
    domain::{Job, JobId},
    services::JobQueueService,
};
use bidforge::notify::adapters::RecordingNotifier;
use bidforge::runner::{
    domain::RunSummary,
    handlers::{DailyDigestHandler, SlackNotificationHandler, UniversalExecutorHandler},
    ports::{CollaboratorResult, StepExecutor, StepRequest, StepResult},
    services::{HandlerRegistry, JobRunner},
};
use chrono::TimeDelta;
use eyre::{WrapErr, eyre};
use rstest::fixture;
use serde_json::{Map, json};

/// Runner type used by the BDD world.
pub type TestRunner = JobRunner<InMemoryJobRepository, InMemoryEventLog, ManualClock>;

/// Step executor that finishes after a fixed number of equally long steps.
pub struct SteadyExecutor {
    clock: Arc<ManualClock>,
    steps: u64,
    cost: TimeDelta,
}

#[async_trait]
impl StepExecutor for SteadyExecutor {
    async fn execute_step(&self, request: StepRequest<'_>) -> CollaboratorResult<StepResult> {
        self.clock.advance(self.cost);
        let mut state_updates = Map::new();
        state_updates.insert("lastStep".to_owned(), json!(request.step));
        Ok(StepResult {
            output: json!({"step": request.step}),
            tool_calls: Vec::new(),
            state_updates,
            done: request.step.saturating_add(1) >= self.steps,
        })
    }
}

/// Scenario world for job runner behaviour tests.
pub struct JobRunnerWorld {
    pub jobs: Arc<InMemoryJobRepository>,
    pub events: Arc<InMemoryEventLog>,
    pub clock: Arc<ManualClock>,
    pub queue: JobQueueService<InMemoryJobRepository, ManualClock>,
    pub event_log: EventLogService<InMemoryEventLog, ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: RunnerConfig,
    pub step_plan: (u64, TimeDelta),
    pub named_jobs: HashMap<String, JobId>,
    pub last_summary: Option<RunSummary>,
}

impl JobRunnerWorld {
    /// Creates a world with empty stores and a manual clock.
    #[must_use]
    pub fn new() -> Self {
        let jobs = Arc::new(InMemoryJobRepository::new());
        let events = Arc::new(InMemoryEventLog::new());
        let clock = Arc::new(ManualClock::new());
        Self {
            queue: JobQueueService::new(Arc::clone(&jobs), Arc::clone(&clock)),
            event_log: EventLogService::new(Arc::clone(&events), Arc::clone(&clock)),
            jobs,
            events,
            clock,
            notifier: Arc::new(RecordingNotifier::new()),
            config: RunnerConfig::default(),
            step_plan: (1, TimeDelta::seconds(1)),
            named_jobs: HashMap::new(),
            last_summary: None,
        }
    }

    /// Builds a runner over the world's stores with the built-in handlers
    /// the scenarios exercise.
    pub fn runner(&self) -> Result<TestRunner, eyre::Report> {
        let (steps, cost) = self.step_plan;
        let executor = Arc::new(SteadyExecutor {
            clock: Arc::clone(&self.clock),
            steps,
            cost,
        });
        let registry = HandlerRegistry::new()
            .with(Arc::new(DailyDigestHandler::new(
                Arc::clone(&self.events),
                Arc::clone(&self.clock),
                self.notifier.clone(),
            )))
            .and_then(|registry| {
                registry.with(Arc::new(SlackNotificationHandler::new(
                    self.notifier.clone(),
                )))
            })
            .and_then(|registry| {
                registry.with(Arc::new(UniversalExecutorHandler::new(
                    executor,
                    Arc::clone(&self.events),
                    Arc::clone(&self.clock),
                    CheckpointPolicy::new(
                        self.config.checkpoint_step_interval,
                        self.config.checkpoint_time_interval(),
                    ),
                    self.config.max_steps,
                )))
            })
            .wrap_err("register scenario handlers")?;
        Ok(JobRunner::new(
            Arc::clone(&self.jobs),
            Arc::clone(&self.events),
            Arc::clone(&self.clock),
            registry,
            self.notifier.clone(),
            self.config.clone(),
        ))
    }

    /// Remembers a created job under a scenario name.
    pub fn remember(&mut self, name: String, job: &Job) {
        self.named_jobs.insert(name, job.id());
    }

    /// Loads the current state of a named job.
    pub fn job(&self, name: &str) -> Result<Job, eyre::Report> {
        let id = self
            .named_jobs
            .get(name)
            .copied()
            .ok_or_else(|| eyre!("no job named {name} in scenario world"))?;
        run_async(self.queue.find(id))
            .wrap_err("load job")?
            .ok_or_else(|| eyre!("job {name} missing from the queue"))
    }
}

impl Default for JobRunnerWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> JobRunnerWorld {
    JobRunnerWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
