//! Job repository tests against `PostgreSQL`.

use std::sync::Arc;

use crate::postgres::helpers::{
    CleanupGuard, ensure_template, queued_job, setup_stores, test_runtime,
};
use crate::test_helpers::start;
use bidforge::event::domain::EventId;
use bidforge::job::{
    domain::{JobId, JobStatus, MAX_ERROR_CHARS},
    ports::{JobRepository, JobRepositoryError},
};
use chrono::TimeDelta;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn created_job_reads_back_unchanged(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_job_create_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let stores = setup_stores(shared_test_cluster, &db_name, 1).expect("store setup");
    let job = queued_job(&stores.clock, "agent_universal_executor", start());

    let rt = test_runtime();
    rt.block_on(stores.jobs.create(&job)).expect("create should succeed");
    let found = rt
        .block_on(stores.jobs.find_by_id(job.id()))
        .expect("lookup should succeed")
        .expect("job should exist");

    assert_eq!(found, job);
    assert!(
        rt.block_on(stores.jobs.find_by_id(JobId::new()))
            .expect("lookup should succeed")
            .is_none()
    );
}

#[rstest]
fn creating_the_same_id_twice_is_a_duplicate(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_job_duplicate_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let stores = setup_stores(shared_test_cluster, &db_name, 1).expect("store setup");
    let job = queued_job(&stores.clock, "slack_notification", start());

    let rt = test_runtime();
    rt.block_on(stores.jobs.create(&job)).expect("create should succeed");
    let result = rt.block_on(stores.jobs.create(&job));

    assert!(matches!(
        result,
        Err(JobRepositoryError::DuplicateJob(id)) if id == job.id()
    ));
}

#[rstest]
fn due_reads_queued_jobs_in_due_order_and_pages_past_a_position(
    shared_test_cluster: &'static TestCluster,
) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_job_due_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let stores = setup_stores(shared_test_cluster, &db_name, 1).expect("store setup");
    let latest = queued_job(&stores.clock, "b", start() - TimeDelta::minutes(1));
    let earliest = queued_job(&stores.clock, "a", start() - TimeDelta::minutes(30));
    let middle = queued_job(&stores.clock, "c", start() - TimeDelta::minutes(10));
    let running = queued_job(&stores.clock, "d", start() - TimeDelta::minutes(20));
    let future = queued_job(&stores.clock, "e", start() + TimeDelta::hours(1));

    let rt = test_runtime();
    for job in [&latest, &earliest, &middle, &running, &future] {
        rt.block_on(stores.jobs.create(job)).expect("create should succeed");
    }
    rt.block_on(stores.jobs.try_mark_running(running.id(), start()))
        .expect("claim should succeed");

    let due = rt
        .block_on(stores.jobs.due(start(), None, 10))
        .expect("due query should succeed");
    let paged = rt
        .block_on(stores.jobs.due(start(), Some(earliest.due_position()), 10))
        .expect("due query should succeed");
    let first_only = rt
        .block_on(stores.jobs.due(start(), None, 1))
        .expect("due query should succeed");

    let ids: Vec<JobId> = due.iter().map(|job| job.id()).collect();
    assert_eq!(ids, vec![earliest.id(), middle.id(), latest.id()]);
    let paged_ids: Vec<JobId> = paged.iter().map(|job| job.id()).collect();
    assert_eq!(paged_ids, vec![middle.id(), latest.id()]);
    assert_eq!(first_only.len(), 1);
}

#[rstest]
fn concurrent_claims_have_exactly_one_winner(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_job_claim_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let stores = setup_stores(shared_test_cluster, &db_name, 4).expect("store setup");
    let job = queued_job(&stores.clock, "github_pr_checks", start());
    let jobs = Arc::new(stores.jobs);

    let rt = test_runtime();
    rt.block_on(jobs.create(&job)).expect("create should succeed");
    let winners = rt.block_on(async {
        let mut handles = Vec::new();
        for _ in 0..8 {
            let contender = Arc::clone(&jobs);
            let id = job.id();
            handles.push(tokio::spawn(async move {
                contender.try_mark_running(id, start()).await
            }));
        }
        let mut count = 0;
        for handle in handles {
            let claimed = handle
                .await
                .expect("task should join")
                .expect("claim should not error");
            if claimed.is_some() {
                count += 1;
            }
        }
        count
    });

    assert_eq!(winners, 1);
    let stored = rt
        .block_on(jobs.find_by_id(job.id()))
        .expect("lookup should succeed")
        .expect("job should exist");
    assert_eq!(stored.status(), JobStatus::Running);
    assert_eq!(stored.started_at(), Some(start()));
}

#[rstest]
fn terminal_updates_and_checkpoints_are_recorded(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_job_terminal_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let stores = setup_stores(shared_test_cluster, &db_name, 1).expect("store setup");
    let completed = queued_job(&stores.clock, "agent_daily_digest", start());
    let failed = queued_job(&stores.clock, "ecs_rollout_verify", start());
    let paused = queued_job(&stores.clock, "agent_universal_executor", start());
    let finished_at = start() + TimeDelta::seconds(45);
    let checkpoint = EventId::new();

    let rt = test_runtime();
    for job in [&completed, &failed, &paused] {
        rt.block_on(stores.jobs.create(job)).expect("create should succeed");
        rt.block_on(stores.jobs.try_mark_running(job.id(), start()))
            .expect("claim should succeed");
    }
    rt.block_on(stores.jobs.complete(completed.id(), json!({"sent": 3}), finished_at))
        .expect("completion should succeed");
    rt.block_on(stores.jobs.fail(failed.id(), &"x".repeat(1200), finished_at))
        .expect("failure should succeed");
    rt.block_on(stores.jobs.mark_checkpointed(paused.id(), checkpoint, finished_at))
        .expect("checkpoint should succeed");
    let missing = rt.block_on(stores.jobs.complete(JobId::new(), json!({}), finished_at));

    let load = |id| {
        rt.block_on(stores.jobs.find_by_id(id))
            .expect("lookup should succeed")
            .expect("job should exist")
    };
    let done = load(completed.id());
    assert_eq!(done.status(), JobStatus::Completed);
    assert_eq!(done.result(), Some(&json!({"sent": 3})));
    assert_eq!(done.finished_at(), Some(finished_at));
    let broken = load(failed.id());
    assert_eq!(broken.status(), JobStatus::Failed);
    assert_eq!(broken.error().map(str::len), Some(MAX_ERROR_CHARS));
    let resumable = load(paused.id());
    assert_eq!(resumable.status(), JobStatus::Running);
    assert_eq!(resumable.checkpoint_id(), Some(checkpoint));
    assert!(matches!(missing, Err(JobRepositoryError::NotFound(_))));
}
