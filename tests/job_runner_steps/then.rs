//! Then steps for job runner BDD scenarios.

use std::sync::Arc;

use super::world::{JobRunnerWorld, run_async};
use crate::test_helpers::start;
use bidforge::checkpoint::services::CheckpointStore;
use bidforge::job::domain::{JobStatus, JobType};
use bidforge::runner::handlers::UNIVERSAL_EXECUTOR;
use chrono::TimeDelta;
use eyre::{WrapErr, ensure, eyre};
use rstest_bdd_macros::then;
use serde_json::json;

#[then(r#"job "{name}" is {status}"#)]
fn job_has_status(world: &mut JobRunnerWorld, name: String, status: String) -> Result<(), eyre::Report> {
    let job = world.job(&name)?;
    ensure!(
        job.status().as_str() == status,
        "job {name} is {}, expected {status}",
        job.status()
    );
    Ok(())
}

#[then(r#"job "{name}" failed with "{message}""#)]
fn job_failed_with(world: &mut JobRunnerWorld, name: String, message: String) -> Result<(), eyre::Report> {
    let job = world.job(&name)?;
    ensure!(job.status() == JobStatus::Failed, "job {name} is {}", job.status());
    ensure!(
        job.error() == Some(message.as_str()),
        "job {name} failed with {:?}",
        job.error()
    );
    Ok(())
}

#[then(r#"a "{event_type}" event was recorded for job "{name}""#)]
fn event_recorded_for_job(
    world: &mut JobRunnerWorld,
    event_type: String,
    name: String,
) -> Result<(), eyre::Report> {
    let job = world.job(&name)?;
    let events = run_async(world.event_log.list_recent(&job.scope_id(), 50))
        .wrap_err("list scope events")?;
    let job_id = json!(job.id().to_string());
    ensure!(
        events
            .iter()
            .any(|event| event.event_type().as_str() == event_type
                && event.payload()["jobId"] == job_id),
        "no {event_type} event for job {name}"
    );
    Ok(())
}

#[then(r#"an email was sent to "{recipient}""#)]
fn email_sent(world: &mut JobRunnerWorld, recipient: String) -> Result<(), eyre::Report> {
    let mail = world.notifier.mail_messages();
    ensure!(
        mail.iter().any(|message| message.to.contains(&recipient)),
        "no email to {recipient} among {} sent",
        mail.len()
    );
    Ok(())
}

#[then(r#"a queued "{job_type}" job is due {hours:i64} hours later"#)]
fn follow_up_due(world: &mut JobRunnerWorld, job_type: String, hours: i64) -> Result<(), eyre::Report> {
    let kind = JobType::new(job_type.as_str()).wrap_err("parse job type")?;
    let queued = run_async(world.queue.list_by_type(&kind, 10, Some(JobStatus::Queued)))
        .wrap_err("list queued jobs")?;
    let expected = start() + TimeDelta::hours(hours);
    ensure!(
        queued.iter().any(|job| job.due_at() == expected),
        "no queued {job_type} job due at {expected}"
    );
    Ok(())
}

#[then(r#"job "{name}" has a checkpoint at step {step:u64}"#)]
fn job_has_checkpoint(world: &mut JobRunnerWorld, name: String, step: u64) -> Result<(), eyre::Report> {
    let job = world.job(&name)?;
    let checkpoint_id = job
        .checkpoint_id()
        .ok_or_else(|| eyre!("job {name} has no checkpoint"))?;
    let store = CheckpointStore::new(Arc::clone(&world.events), Arc::clone(&world.clock));
    let record = run_async(store.find(checkpoint_id))
        .wrap_err("load checkpoint")?
        .ok_or_else(|| eyre!("checkpoint {checkpoint_id} missing"))?;
    ensure!(record.step == step, "checkpoint is at step {}", record.step);
    Ok(())
}

#[then(r#"job "{name}" was continued by a job that completed after {steps:u64} steps"#)]
fn continued_to_completion(
    world: &mut JobRunnerWorld,
    name: String,
    steps: u64,
) -> Result<(), eyre::Report> {
    let job = world.job(&name)?;
    let checkpoint_id = job
        .checkpoint_id()
        .ok_or_else(|| eyre!("job {name} has no checkpoint"))?;
    let kind = JobType::new(UNIVERSAL_EXECUTOR).wrap_err("parse job type")?;
    let runs = run_async(world.queue.list_by_type(&kind, 10, Some(JobStatus::Completed)))
        .wrap_err("list completed runs")?;
    let continuation = runs
        .iter()
        .find(|run| run.resume_from() == Some(checkpoint_id))
        .ok_or_else(|| eyre!("no completed continuation of {name}"))?;
    ensure!(
        continuation.result().map(|result| &result["steps"]) == Some(&json!(steps)),
        "continuation finished with {:?}",
        continuation.result()
    );
    Ok(())
}

#[then("the last pass skipped {count:usize} jobs")]
fn last_pass_skipped(world: &mut JobRunnerWorld, count: usize) -> Result<(), eyre::Report> {
    let summary = world
        .last_summary
        .ok_or_else(|| eyre!("no runner pass in scenario world"))?;
    ensure!(summary.skipped == count, "last pass skipped {}", summary.skipped);
    Ok(())
}
