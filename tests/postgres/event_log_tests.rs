//! Event log tests against `PostgreSQL`.

use crate::postgres::helpers::{CleanupGuard, ensure_template, setup_stores, test_runtime};
use crate::test_helpers::start;
use bidforge::event::{
    domain::{AgentEvent, EventId, EventType, NewEvent, ScopeId},
    ports::{EventLogError, EventLogRepository},
};
use chrono::TimeDelta;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;
use serde_json::json;

fn scope(value: &str) -> ScopeId {
    ScopeId::new(value).expect("valid scope")
}

#[rstest]
fn appended_event_reads_back_with_its_envelope(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_event_append_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let stores = setup_stores(shared_test_cluster, &db_name, 1).expect("store setup");
    let event = AgentEvent::record(
        NewEvent::new(
            scope("rfp-7"),
            EventType::new("tool_call").expect("valid event type"),
            json!({"step": 2}),
        )
        .with_tool("search")
        .with_policy_checks([json!({"rule": "pii", "passed": true})])
        .with_confidence_flags(["low_recall".to_owned()])
        .with_created_by("job_runner"),
        &stores.clock,
    );

    let rt = test_runtime();
    rt.block_on(stores.events.append(&event)).expect("append should succeed");
    let found = rt
        .block_on(stores.events.find_by_id(event.id()))
        .expect("lookup should succeed")
        .expect("event should exist");
    let duplicate = rt.block_on(stores.events.append(&event));

    assert_eq!(found, event);
    assert!(matches!(duplicate, Err(EventLogError::Duplicate(id)) if id == event.id()));
    assert!(
        rt.block_on(stores.events.find_by_id(EventId::new()))
            .expect("lookup should succeed")
            .is_none()
    );
}

#[rstest]
fn listings_follow_creation_order(shared_test_cluster: &'static TestCluster) {
    ensure_template(shared_test_cluster).expect("template setup");
    let db_name = format!("test_event_order_{}", uuid::Uuid::new_v4());
    let _guard = CleanupGuard::new(shared_test_cluster, db_name.clone());
    let stores = setup_stores(shared_test_cluster, &db_name, 1).expect("store setup");
    let checkpoint = EventType::new("checkpoint").expect("valid event type");

    let rt = test_runtime();
    let mut recorded = Vec::new();
    for (index, scope_id) in ["rfp-7", "rfp-8", "rfp-7", "rfp-7"].into_iter().enumerate() {
        let event = AgentEvent::record(
            NewEvent::new(scope(scope_id), checkpoint.clone(), json!({"index": index})),
            &stores.clock,
        );
        rt.block_on(stores.events.append(&event)).expect("append should succeed");
        recorded.push(event.id());
        stores.clock.advance(TimeDelta::seconds(10));
    }

    let recent = rt
        .block_on(stores.events.list_recent(&scope("rfp-7"), 2))
        .expect("listing should succeed");
    let since = rt
        .block_on(stores.events.list_since(start() + TimeDelta::seconds(10), 10))
        .expect("listing should succeed");

    let recent_ids: Vec<EventId> = recent.iter().map(AgentEvent::id).collect();
    let expected_recent: Vec<EventId> = recorded.iter().rev().take(2).copied().collect();
    assert_eq!(recent_ids, expected_recent);
    let since_ids: Vec<EventId> = since.iter().map(AgentEvent::id).collect();
    let expected_since: Vec<EventId> = recorded.iter().skip(1).copied().collect();
    assert_eq!(since_ids, expected_since);
}
