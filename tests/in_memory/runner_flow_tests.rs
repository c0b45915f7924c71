//! Whole runner passes over the built-in handlers.

use super::helpers::{Stores, due_now, stores};
use crate::test_helpers::{EnvVarGuard, ManualClock, start};
use async_trait::async_trait;
use bidforge::config::RunnerConfig;
use bidforge::event::{adapters::memory::InMemoryEventLog, domain::ScopeId};
use bidforge::job::{
    adapters::memory::InMemoryJobRepository,
    domain::{JobStatus, JobType},
};
use bidforge::notify::adapters::RecordingNotifier;
use bidforge::runner::{
    handlers::{
        ChangeProposalHandler, GITHUB_PR_CHECKS, PrChecksHandler, SLACK_NOTIFICATION,
        SlackNotificationHandler,
    },
    ports::{
        ChangeProposal, ChecksReport, ChecksState, CollaboratorResult, PullRequestHost,
        PullRequestRef,
    },
    services::{HandlerRegistry, JobRunner},
};
use chrono::TimeDelta;
use rstest::rstest;
use serde_json::json;
use std::ffi::OsString;
use std::sync::Arc;

type Runner = JobRunner<InMemoryJobRepository, InMemoryEventLog, ManualClock>;

fn runner(
    stores: &Stores,
    registry: HandlerRegistry,
    chat: &Arc<RecordingNotifier>,
    config: RunnerConfig,
) -> Runner {
    JobRunner::new(
        Arc::clone(&stores.jobs),
        Arc::clone(&stores.events),
        Arc::clone(&stores.clock),
        registry,
        chat.clone(),
        config,
    )
}

/// Host whose pull requests always pass their checks.
struct GreenHost;

#[async_trait]
impl PullRequestHost for GreenHost {
    async fn open_change_proposal(
        &self,
        proposal: &ChangeProposal,
    ) -> CollaboratorResult<PullRequestRef> {
        Ok(PullRequestRef {
            number: Some(7),
            url: format!("https://github.com/acme/bids/pull/7#{}", proposal.proposal_id),
        })
    }

    async fn checks(&self, _pull_request: &str) -> CollaboratorResult<ChecksReport> {
        Ok(ChecksReport {
            state: ChecksState::Passing,
            failing: Vec::new(),
            total: 5,
        })
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notification_is_delivered_and_summarised(stores: Stores) {
    let chat = Arc::new(RecordingNotifier::new());
    let registry = HandlerRegistry::new()
        .with(Arc::new(SlackNotificationHandler::new(chat.clone())))
        .expect("registration should succeed");
    let runner = runner(
        &stores,
        registry,
        &chat,
        RunnerConfig::default().with_summary_channel(Some("C0RUNS".to_owned())),
    );
    let job = stores
        .queue
        .create(due_now(SLACK_NOTIFICATION).with_payload(json!({
            "channelId": "C1",
            "text": "Section 3 is ready for review",
        })))
        .await
        .expect("creation should succeed");

    let summary = runner.run_once().await.expect("pass should succeed");

    assert_eq!((summary.attempted, summary.completed), (1, 1));
    let stored = stores
        .queue
        .find(job.id())
        .await
        .expect("lookup should succeed")
        .expect("job exists");
    assert_eq!(stored.status(), JobStatus::Completed);
    assert_eq!(stored.result(), Some(&json!({"channelId": "C1", "ts": "recorded-1"})));
    let channels: Vec<String> = chat
        .chat_messages()
        .into_iter()
        .map(|message| message.channel)
        .collect();
    assert_eq!(channels, vec!["C1".to_owned(), "C0RUNS".to_owned()]);
    let summaries = stores
        .event_log
        .list_recent(&ScopeId::global(), 10)
        .await
        .expect("listing should succeed");
    let event = summaries.first().expect("one runner summary");
    assert_eq!(event.event_type().as_str(), "runner_summary");
    assert_eq!(event.payload()["attempted"], json!(1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn change_proposal_flows_into_a_checks_verdict(stores: Stores) {
    let chat = Arc::new(RecordingNotifier::new());
    let host: Arc<GreenHost> = Arc::new(GreenHost);
    let registry = HandlerRegistry::new()
        .with(Arc::new(ChangeProposalHandler::new(host.clone(), chat.clone())))
        .and_then(|registry| registry.with(Arc::new(PrChecksHandler::new(host, chat.clone()))))
        .expect("registration should succeed");
    let runner = runner(&stores, registry, &chat, RunnerConfig::default());
    stores
        .queue
        .create(
            due_now("change_proposal_open_pr")
                .with_payload(json!({"proposalId": "cp-5", "channelId": "C2", "threadTs": "99.1"})),
        )
        .await
        .expect("creation should succeed");

    runner.run_once().await.expect("first pass should succeed");
    let checks_type = JobType::new(GITHUB_PR_CHECKS).expect("valid type");
    let polls = stores
        .queue
        .list_by_type(&checks_type, 10, Some(JobStatus::Queued))
        .await
        .expect("listing should succeed");
    let poll = polls.first().expect("checks poll scheduled");
    assert_eq!(poll.due_at(), start() + TimeDelta::minutes(2));

    stores.clock.advance(TimeDelta::minutes(2));
    let second = runner.run_once().await.expect("second pass should succeed");

    assert_eq!(second.completed, 1);
    let texts: Vec<String> = chat
        .chat_messages()
        .into_iter()
        .filter(|message| message.thread_ts.as_deref() == Some("99.1"))
        .map(|message| message.text)
        .collect();
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().any(|text| text.starts_with("All 5 checks passed on")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn environment_limits_how_much_one_pass_drains(stores: Stores) {
    let config = {
        let _guard = EnvVarGuard::set_many(&[
            (
                OsString::from("BIDFORGE_BATCH_LIMIT"),
                Some(OsString::from("1")),
            ),
            (
                OsString::from("BIDFORGE_MAX_BATCHES"),
                Some(OsString::from("2")),
            ),
        ]);
        RunnerConfig::from_env().expect("configuration should load")
    };
    let chat = Arc::new(RecordingNotifier::new());
    let registry = HandlerRegistry::new()
        .with(Arc::new(SlackNotificationHandler::new(chat.clone())))
        .expect("registration should succeed");
    let runner = runner(&stores, registry, &chat, config);
    for index in 0..3 {
        stores
            .queue
            .create(
                due_now(SLACK_NOTIFICATION)
                    .with_payload(json!({"channelId": "C3", "text": format!("update {index}")})),
            )
            .await
            .expect("creation should succeed");
    }

    let summary = runner.run_once().await.expect("pass should succeed");

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.completed, 2);
    let queued = stores
        .queue
        .list_recent(10, Some(JobStatus::Queued))
        .await
        .expect("listing should succeed");
    assert_eq!(queued.len(), 1);
}
