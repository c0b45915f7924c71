//! Given steps for job runner BDD scenarios.

use super::world::{JobRunnerWorld, run_async};
use crate::test_helpers::{EnvVarGuard, start};
use bidforge::config::RunnerConfig;
use bidforge::job::services::CreateJobRequest;
use bidforge::runner::handlers::{DAILY_DIGEST, SLACK_NOTIFICATION, UNIVERSAL_EXECUTOR};
use chrono::TimeDelta;
use eyre::{WrapErr, eyre};
use rstest_bdd_macros::given;
use serde_json::json;
use std::ffi::OsString;

fn create(
    world: &mut JobRunnerWorld,
    name: String,
    request: CreateJobRequest,
) -> Result<(), eyre::Report> {
    let job = run_async(world.queue.create(request)).wrap_err("create scenario job")?;
    world.remember(name, &job);
    Ok(())
}

fn notification(text: &str) -> CreateJobRequest {
    CreateJobRequest::new(SLACK_NOTIFICATION)
        .with_payload(json!({"channelId": "C0OPS", "text": text}))
}

#[given(r#"a daily digest job named "{name}" for "{recipient}""#)]
fn daily_digest_job(
    world: &mut JobRunnerWorld,
    name: String,
    recipient: String,
) -> Result<(), eyre::Report> {
    let request = CreateJobRequest::new(DAILY_DIGEST)
        .with_due_at(start())
        .with_payload(json!({"to": [recipient]}));
    create(world, name, request)
}

#[given(r#"a due "{job_type}" job named "{name}""#)]
fn due_job(world: &mut JobRunnerWorld, job_type: String, name: String) -> Result<(), eyre::Report> {
    create(world, name, CreateJobRequest::new(job_type).with_due_at(start()))
}

#[given("continuations start immediately")]
fn continuations_start_immediately(world: &mut JobRunnerWorld) -> Result<(), eyre::Report> {
    let _guard = EnvVarGuard::set_many(&[(
        OsString::from("BIDFORGE_CONTINUATION_DELAY_SECS"),
        Some(OsString::from("0")),
    )]);
    world.config = RunnerConfig::from_env().wrap_err("load runner configuration")?;
    Ok(())
}

#[given(r#"an agent run named "{name}" needing {steps:u64} steps of {minutes:i64} minutes"#)]
fn agent_run(
    world: &mut JobRunnerWorld,
    name: String,
    steps: u64,
    minutes: i64,
) -> Result<(), eyre::Report> {
    world.step_plan = (steps, TimeDelta::minutes(minutes));
    let request = CreateJobRequest::new(UNIVERSAL_EXECUTOR)
        .with_due_at(start())
        .with_payload(json!({"rfpIds": ["rfp-1"]}));
    create(world, name, request)
}

#[given(r#"a notification named "{name}" due in {minutes:i64} minutes"#)]
fn future_notification(
    world: &mut JobRunnerWorld,
    name: String,
    minutes: i64,
) -> Result<(), eyre::Report> {
    let request = notification(&name).with_due_at(start() + TimeDelta::minutes(minutes));
    create(world, name, request)
}

#[given(r#"a notification named "{name}" waiting on "{prerequisite}""#)]
fn dependent_notification(
    world: &mut JobRunnerWorld,
    name: String,
    prerequisite: String,
) -> Result<(), eyre::Report> {
    let dependency = world
        .named_jobs
        .get(&prerequisite)
        .copied()
        .ok_or_else(|| eyre!("no job named {prerequisite} in scenario world"))?;
    let request = notification(&name)
        .with_due_at(start())
        .with_depends_on([dependency]);
    create(world, name, request)
}
