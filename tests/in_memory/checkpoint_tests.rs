//! Checkpoints persisted on the event log.

use super::helpers::{Stores, due_now, stores};
use bidforge::checkpoint::domain::{CheckpointDraft, SaveCheckpoint};
use bidforge::event::domain::{EventType, NewEvent, ScopeId};
use bidforge::job::domain::JobId;
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::{Map, json};

fn draft(step: u64) -> CheckpointDraft {
    let mut data = Map::new();
    data.insert("rfpIds".to_owned(), json!(["rfp-3"]));
    data.insert("section".to_owned(), json!(format!("s{step}")));
    CheckpointDraft::new(step, data).with_tool_calls(vec![json!({"tool": "search"})])
}

async fn save(stores: &Stores, scope: &ScopeId, job_id: JobId, step: u64) {
    stores
        .checkpoints
        .save(SaveCheckpoint {
            scope_id: scope.clone(),
            job_id: Some(job_id),
            draft: draft(step),
        })
        .await
        .expect("save should succeed");
    stores.clock.advance(TimeDelta::seconds(30));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restore_returns_the_newest_checkpoint_of_the_job(stores: Stores) {
    let scope = ScopeId::new("rfp-3").expect("valid scope");
    let job = stores
        .queue
        .create(due_now("agent_universal_executor"))
        .await
        .expect("creation should succeed");
    let other = JobId::new();
    save(&stores, &scope, job.id(), 1).await;
    save(&stores, &scope, job.id(), 2).await;
    save(&stores, &scope, other, 9).await;

    let resume = stores
        .checkpoints
        .restore(&scope, Some(job.id()))
        .await
        .expect("restore should succeed")
        .expect("a checkpoint exists");

    assert_eq!(resume.step, 2);
    assert_eq!(resume.checkpoint_data["section"], json!("s2"));
    assert_eq!(resume.tool_calls, vec![json!({"tool": "search"})]);
    assert!(resume.validate(&["rfpIds", "section"]).is_ok());

    let any_job = stores
        .checkpoints
        .get_latest(&scope, None)
        .await
        .expect("lookup should succeed")
        .expect("a checkpoint exists");
    assert_eq!(any_job.job_id, Some(other));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn checkpoints_stay_inside_their_scope(stores: Stores) {
    let job = JobId::new();
    save(&stores, &ScopeId::new("rfp-3").expect("valid scope"), job, 4).await;

    let elsewhere = stores
        .checkpoints
        .restore(&ScopeId::new("rfp-4").expect("valid scope"), Some(job))
        .await
        .expect("restore should succeed");

    assert_eq!(elsewhere, None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unrelated_events_are_not_checkpoints(stores: Stores) {
    let scope = ScopeId::new("rfp-3").expect("valid scope");
    stores
        .event_log
        .append(NewEvent::new(
            scope.clone(),
            EventType::new("draft_generated").expect("valid type"),
            json!({"step": 3}),
        ))
        .await
        .expect("append should succeed");

    let latest = stores
        .checkpoints
        .get_latest(&scope, None)
        .await
        .expect("lookup should succeed");

    assert_eq!(latest, None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cleanup_counts_checkpoints_past_the_retention_window(stores: Stores) {
    let scope = ScopeId::new("rfp-3").expect("valid scope");
    let job = JobId::new();
    for step in 1..=5 {
        save(&stores, &scope, job, step).await;
    }

    let stale = stores
        .checkpoints
        .cleanup(&scope, Some(job), 3)
        .await
        .expect("cleanup should succeed");

    assert_eq!(stale, 2);
    assert_eq!(stores.events.len(), 5);
}
