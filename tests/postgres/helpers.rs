//! Shared helpers for `PostgreSQL` integration tests.

use bidforge::event::adapters::postgres::PostgresEventLog;
use bidforge::job::adapters::postgres::{JobPgPool, PostgresJobRepository};
use bidforge::job::domain::{Job, JobId, JobScope, JobType, NewJob};
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use pg_embedded_setup_unpriv::TestCluster;
use serde_json::json;
use tokio::runtime::Runtime;

use crate::test_helpers::ManualClock;

/// Boxed error type for test setup.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the job table and its due-time index.
pub const CREATE_JOBS_SQL: &str =
    include_str!("../../migrations/2026-01-05-000000_create_agent_jobs/up.sql");

/// SQL creating the append-only event log.
pub const CREATE_EVENTS_SQL: &str =
    include_str!("../../migrations/2026-01-05-000001_create_agent_events/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "bidforge_test_template";

/// Creates a multi-threaded runtime so blocking pool work can overlap.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with both migrations applied.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_JOBS_SQL)
                .map_err(|e| eyre::eyre!("job migration failed: {e}"))?;
            conn.batch_execute(CREATE_EVENTS_SQL)
                .map_err(|e| eyre::eyre!("event migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Creates a database from the template and returns a pool over it.
pub fn setup_pool(
    cluster: &TestCluster,
    db_name: &str,
    max_size: u32,
) -> Result<JobPgPool, BoxError> {
    cluster
        .create_database_from_template(db_name, TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let url = cluster.connection().database_url(db_name);
    let pool = Pool::builder()
        .max_size(max_size)
        .build(ConnectionManager::<PgConnection>::new(url))
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(pool)
}

/// Stores under test, sharing one database.
pub struct Stores {
    pub jobs: PostgresJobRepository,
    pub events: PostgresEventLog,
    pub clock: ManualClock,
}

/// Creates both adapters over a fresh database.
pub fn setup_stores(
    cluster: &TestCluster,
    db_name: &str,
    max_size: u32,
) -> Result<Stores, BoxError> {
    let pool = setup_pool(cluster, db_name, max_size)?;
    Ok(Stores {
        jobs: PostgresJobRepository::new(pool.clone()),
        events: PostgresEventLog::new(pool),
        clock: ManualClock::new(),
    })
}

/// Builds a queued job of `job_type` due at `due_at`.
pub fn queued_job(clock: &ManualClock, job_type: &str, due_at: DateTime<Utc>) -> Job {
    Job::queued(
        JobId::new(),
        NewJob {
            job_type: JobType::new(job_type).expect("valid job type"),
            scope: JobScope::new().with("rfpId", "rfp-7"),
            payload: json!({"rfpIds": ["rfp-7"]}),
            due_at,
            requested_by: Some("U123".to_owned()),
            depends_on: Vec::new(),
            idempotency_key: None,
            resume_from: None,
        },
        clock,
    )
}

/// Guard that drops the test database even if the test panics.
pub struct CleanupGuard<'a> {
    cluster: &'a TestCluster,
    db_name: String,
}

impl<'a> CleanupGuard<'a> {
    pub const fn new(cluster: &'a TestCluster, db_name: String) -> Self {
        Self { cluster, db_name }
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(&*self.db_name) {
            tracing::warn!(database = %self.db_name, error = %e, "failed to drop test database");
        }
    }
}
