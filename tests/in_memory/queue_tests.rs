//! Queue behaviour through the public service API.

use super::helpers::{Stores, due_now, stores};
use crate::test_helpers::start;
use bidforge::job::domain::{JobScope, JobStatus};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_creation_with_a_key_returns_the_first_job(stores: Stores) {
    let first = stores
        .queue
        .create(due_now("slack_notification").with_idempotency_key("notify:rfp-7"))
        .await
        .expect("creation should succeed");
    let second = stores
        .queue
        .create(
            due_now("slack_notification")
                .with_idempotency_key("notify:rfp-7")
                .with_payload(json!({"text": "different"})),
        )
        .await
        .expect("repeat creation should succeed");

    assert_eq!(first.id(), second.id());
    assert_eq!(second.payload(), first.payload());
    assert_eq!(
        stores
            .queue
            .list_recent(10, None)
            .await
            .expect("listing should succeed")
            .len(),
        1
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn due_jobs_come_back_oldest_first(stores: Stores) {
    for (job_type, offset) in [("late", 0), ("early", -30), ("future", 10), ("middle", -5)] {
        stores
            .queue
            .create(
                due_now(job_type).with_due_at(start() + TimeDelta::minutes(offset)),
            )
            .await
            .expect("creation should succeed");
    }

    let due = stores.queue.claim_due(10).await.expect("claim should succeed");

    let order: Vec<&str> = due.iter().map(|job| job.job_type().as_str()).collect();
    assert_eq!(order, vec!["early", "middle", "late"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_one_claimer_wins_a_job(stores: Stores) {
    let job = stores
        .queue
        .create(due_now("agent_state_refresh"))
        .await
        .expect("creation should succeed");
    let queue = Arc::new(stores.queue);
    let id = job.id();

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let contender = Arc::clone(&queue);
            tokio::spawn(async move { contender.try_mark_running(id).await })
        })
        .collect();
    let mut winners = 0;
    for attempt in attempts {
        let claimed = attempt
            .await
            .expect("task should not panic")
            .expect("claim should not error");
        if claimed.is_some() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    let stored = queue
        .find(job.id())
        .await
        .expect("lookup should succeed")
        .expect("job exists");
    assert_eq!(stored.status(), JobStatus::Running);
    assert_eq!(stored.started_at(), Some(start()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_by_scope_filters_other_entities(stores: Stores) {
    for rfp in ["rfp-1", "rfp-2", "rfp-1"] {
        stores
            .queue
            .create(due_now("agent_daily_digest").with_scope(JobScope::new().with("rfpId", rfp)))
            .await
            .expect("creation should succeed");
    }
    let scope = JobScope::new().with("rfpId", "rfp-1").scope_id();

    let scoped = stores
        .queue
        .list_by_scope(&scope, 10, Some(JobStatus::Queued))
        .await
        .expect("listing should succeed");

    assert_eq!(scoped.len(), 2);
    assert!(scoped.iter().all(|job| job.scope_id() == scope));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failure_messages_are_bounded(stores: Stores) {
    let job = stores
        .queue
        .create(due_now("slack_notification"))
        .await
        .expect("creation should succeed");

    stores
        .queue
        .fail(job.id(), &"x".repeat(5000))
        .await
        .expect("failure should be recorded");

    let failed = stores
        .queue
        .find(job.id())
        .await
        .expect("lookup should succeed")
        .expect("job exists");
    assert_eq!(failed.status(), JobStatus::Failed);
    assert_eq!(failed.error().map(|error| error.chars().count()), Some(900));
}
