//! Shared fixtures for in-memory integration tests.

use crate::test_helpers::{ManualClock, start};
use bidforge::checkpoint::services::CheckpointStore;
use bidforge::event::{adapters::memory::InMemoryEventLog, services::EventLogService};
use bidforge::job::{
    adapters::memory::InMemoryJobRepository,
    services::{CreateJobRequest, JobQueueService},
};
use rstest::fixture;
use std::sync::Arc;

/// Stores, clock, and services shared by one test.
pub struct Stores {
    pub jobs: Arc<InMemoryJobRepository>,
    pub events: Arc<InMemoryEventLog>,
    pub clock: Arc<ManualClock>,
    pub queue: JobQueueService<InMemoryJobRepository, ManualClock>,
    pub event_log: EventLogService<InMemoryEventLog, ManualClock>,
    pub checkpoints: CheckpointStore<InMemoryEventLog, ManualClock>,
}

/// Provides empty stores over a manual clock.
#[fixture]
pub fn stores() -> Stores {
    let jobs = Arc::new(InMemoryJobRepository::new());
    let events = Arc::new(InMemoryEventLog::new());
    let clock = Arc::new(ManualClock::new());
    Stores {
        queue: JobQueueService::new(Arc::clone(&jobs), Arc::clone(&clock)),
        event_log: EventLogService::new(Arc::clone(&events), Arc::clone(&clock)),
        checkpoints: CheckpointStore::new(Arc::clone(&events), Arc::clone(&clock)),
        jobs,
        events,
        clock,
    }
}

/// A request for `job_type` due at the clock's start.
pub fn due_now(job_type: &str) -> CreateJobRequest {
    CreateJobRequest::new(job_type).with_due_at(start())
}
