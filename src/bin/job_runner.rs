//! Runs one pass of the agent job runner against `PostgreSQL`.
//!
//! Usage:
//!
//! ```text
//! job_runner --database-url postgres://localhost/bids [--batch-limit 25]
//!            [--summary-channel C0RUNS]
//! ```
//!
//! The process is meant to be started by a scheduler every few minutes. It
//! drains due jobs until the queue is empty or the time budget runs low,
//! then exits. Tunables are read from `BIDFORGE_*` environment variables;
//! flags override them.

use bidforge::config::RunnerConfig;
use bidforge::event::adapters::postgres::PostgresEventLog;
use bidforge::job::adapters::postgres::{JobPgPool, PostgresJobRepository};
use bidforge::notify::adapters::{LogNotifier, SLACK_BOT_TOKEN, SlackNotifier};
use bidforge::notify::ports::ChatNotifier;
use bidforge::runner::adapters::{AwsCliInspector, GhCliHost};
use bidforge::runner::handlers::{
    ChangeProposalHandler, DailyDigestHandler, PrChecksHandler, RolloutVerifyHandler,
    SlackNotificationHandler, StateRefreshHandler,
};
use bidforge::runner::ports::{DeploymentTarget, PullRequestHost};
use bidforge::runner::services::{HandlerRegistry, JobRunner};
use bidforge::secrets::{EnvSecretSource, SecretCache};
use clap::Parser;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "job_runner", about = "Drain due agent jobs once and exit")]
struct Args {
    /// `PostgreSQL` connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Connections kept in the pool.
    #[arg(long, default_value_t = 4)]
    pool_size: u32,

    /// Jobs claimed per batch; overrides `BIDFORGE_BATCH_LIMIT`.
    #[arg(long, visible_alias = "limit")]
    batch_limit: Option<usize>,

    /// Channel receiving the run summary; overrides
    /// `BIDFORGE_SUMMARY_CHANNEL`.
    #[arg(long)]
    summary_channel: Option<String>,

    /// Repository pull requests are opened against, as `owner/name`.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    github_repository: Option<String>,

    /// Region used for deployment inspection.
    #[arg(long, env = "AWS_REGION")]
    aws_region: Option<String>,

    /// Cluster checked by rollout verification when a job names none.
    #[arg(long, env = "ECS_CLUSTER")]
    ecs_cluster: Option<String>,

    /// Service checked by rollout verification when a job names none.
    #[arg(long, env = "ECS_SERVICE")]
    ecs_service: Option<String>,
}

impl Args {
    fn runner_config(&self) -> Result<RunnerConfig, BoxError> {
        let mut config = RunnerConfig::from_env()?;
        if let Some(limit) = self.batch_limit {
            config = config.with_batch_limit(limit);
        }
        if self.summary_channel.is_some() {
            config = config.with_summary_channel(self.summary_channel.clone());
        }
        Ok(config)
    }

    fn default_target(&self) -> Option<DeploymentTarget> {
        Some(DeploymentTarget {
            cluster: self.ecs_cluster.clone()?,
            service: self.ecs_service.clone()?,
        })
    }
}

fn chat_notifier(clock: &Arc<DefaultClock>) -> Arc<dyn ChatNotifier> {
    let configured = std::env::var(SLACK_BOT_TOKEN).is_ok_and(|token| !token.trim().is_empty());
    if !configured {
        warn!("{SLACK_BOT_TOKEN} is not set; chat messages will only be logged");
        return Arc::new(LogNotifier);
    }
    let secrets = Arc::new(SecretCache::new(EnvSecretSource, Arc::clone(clock)));
    Arc::new(SlackNotifier::new(reqwest::Client::new(), secrets))
}

fn registry(
    args: &Args,
    config: &RunnerConfig,
    jobs: &Arc<PostgresJobRepository>,
    events: &Arc<PostgresEventLog>,
    clock: &Arc<DefaultClock>,
    chat: &Arc<dyn ChatNotifier>,
) -> Result<HandlerRegistry, BoxError> {
    let mut github = GhCliHost::new();
    if let Some(repository) = &args.github_repository {
        github = github.with_repository(repository.clone());
    }
    let host: Arc<dyn PullRequestHost> = Arc::new(github);
    let mut inspector = AwsCliInspector::new();
    if let Some(region) = &args.aws_region {
        inspector = inspector.with_region(region.clone());
    }
    let mut rollout = RolloutVerifyHandler::new(Arc::new(inspector), Arc::clone(chat));
    if let Some(target) = args.default_target() {
        rollout = rollout.with_default_target(target);
    }

    let registry = HandlerRegistry::new()
        .with(Arc::new(
            DailyDigestHandler::new(Arc::clone(events), Arc::clone(clock), Arc::new(LogNotifier))
                .with_default_recipients(config.digest_recipients.clone()),
        ))?
        .with(Arc::new(StateRefreshHandler::new(
            Arc::clone(jobs),
            Arc::clone(events),
            Arc::clone(clock),
        )))?
        .with(Arc::new(SlackNotificationHandler::new(Arc::clone(chat))))?
        .with(Arc::new(ChangeProposalHandler::new(Arc::clone(&host), Arc::clone(chat))))?
        .with(Arc::new(PrChecksHandler::new(host, Arc::clone(chat))))?
        .with(Arc::new(rollout))?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.runner_config()?;

    let pool: JobPgPool = Pool::builder()
        .max_size(args.pool_size)
        .build(ConnectionManager::<PgConnection>::new(&args.database_url))?;
    let jobs = Arc::new(PostgresJobRepository::new(pool.clone()));
    let events = Arc::new(PostgresEventLog::new(pool));
    let clock = Arc::new(DefaultClock);
    let chat = chat_notifier(&clock);
    let handlers = registry(&args, &config, &jobs, &events, &clock, &chat)?;
    info!(job_types = ?handlers.job_types(), "handlers registered");

    let runner = JobRunner::new(jobs, events, clock, handlers, chat, config);
    let summary = runner.run_once().await?;
    info!(
        batches = summary.batches,
        attempted = summary.attempted,
        completed = summary.completed,
        failed = summary.failed,
        checkpointed = summary.checkpointed,
        skipped = summary.skipped,
        "job runner pass finished"
    );
    Ok(())
}
