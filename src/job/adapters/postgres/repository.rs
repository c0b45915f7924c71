//! `PostgreSQL` repository implementation for job storage.

use super::{
    models::{JobRow, NewJobRow},
    schema::agent_jobs,
};
use crate::event::domain::EventId;
use crate::job::{
    domain::{
        DuePosition, IdempotencyKey, Job, JobId, JobScope, JobStatus, JobType,
        PersistedJobData, truncate_error,
    },
    ports::{JobRepository, JobRepositoryError, JobRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::Value;

/// `PostgreSQL` connection pool type used by job adapters.
pub type JobPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed job repository.
///
/// The due-time index is the `(due_at, id)` B-tree created by the
/// migrations; the claim is a single `UPDATE … WHERE status = 'queued'`.
#[derive(Debug, Clone)]
pub struct PostgresJobRepository {
    pool: JobPgPool,
}

impl PostgresJobRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: JobPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> JobRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> JobRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(JobRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(JobRepositoryError::persistence)?
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn create(&self, job: &Job) -> JobRepositoryResult<()> {
        let job_id = job.id();
        let new_row = to_new_row(job)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(agent_jobs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        JobRepositoryError::DuplicateJob(job_id)
                    }
                    _ => JobRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<Job>> {
        self.run_blocking(move |connection| {
            let row = agent_jobs::table
                .filter(agent_jobs::id.eq(id.into_inner()))
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(JobRepositoryError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn due(
        &self,
        now: DateTime<Utc>,
        after: Option<DuePosition>,
        limit: usize,
    ) -> JobRepositoryResult<Vec<Job>> {
        let page = i64::try_from(limit).map_err(JobRepositoryError::persistence)?;
        self.run_blocking(move |connection| {
            let mut query = agent_jobs::table.into_boxed();
            if let Some(position) = after {
                query = query.filter(
                    agent_jobs::due_at.gt(position.due_at).or(agent_jobs::due_at
                        .eq(position.due_at)
                        .and(agent_jobs::id.gt(position.id.into_inner()))),
                );
            }
            let rows = query
                .filter(agent_jobs::due_at.le(now))
                .filter(agent_jobs::status.eq(JobStatus::Queued.as_str()))
                .order((agent_jobs::due_at.asc(), agent_jobs::id.asc()))
                .limit(page)
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobRepositoryError::persistence)?;
            rows.into_iter().map(row_to_job).collect()
        })
        .await
    }

    async fn try_mark_running(
        &self,
        id: JobId,
        at: DateTime<Utc>,
    ) -> JobRepositoryResult<Option<Job>> {
        self.run_blocking(move |connection| {
            let row = diesel::update(
                agent_jobs::table
                    .filter(agent_jobs::id.eq(id.into_inner()))
                    .filter(agent_jobs::status.eq(JobStatus::Queued.as_str())),
            )
            .set((
                agent_jobs::status.eq(JobStatus::Running.as_str()),
                agent_jobs::started_at.eq(Some(at)),
                agent_jobs::updated_at.eq(at),
            ))
            .returning(JobRow::as_returning())
            .get_result::<JobRow>(connection)
            .optional()
            .map_err(JobRepositoryError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn complete(
        &self,
        id: JobId,
        result: Value,
        at: DateTime<Utc>,
    ) -> JobRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(agent_jobs::table.filter(agent_jobs::id.eq(id.into_inner())))
                .set((
                    agent_jobs::status.eq(JobStatus::Completed.as_str()),
                    agent_jobs::result.eq(Some(result)),
                    agent_jobs::finished_at.eq(Some(at)),
                    agent_jobs::updated_at.eq(at),
                ))
                .execute(connection)
                .map_err(JobRepositoryError::persistence)?;
            ensure_updated(updated, id)
        })
        .await
    }

    async fn fail(&self, id: JobId, error: &str, at: DateTime<Utc>) -> JobRepositoryResult<()> {
        let bounded = truncate_error(error);
        self.run_blocking(move |connection| {
            let updated = diesel::update(agent_jobs::table.filter(agent_jobs::id.eq(id.into_inner())))
                .set((
                    agent_jobs::status.eq(JobStatus::Failed.as_str()),
                    agent_jobs::error.eq(Some(bounded)),
                    agent_jobs::finished_at.eq(Some(at)),
                    agent_jobs::updated_at.eq(at),
                ))
                .execute(connection)
                .map_err(JobRepositoryError::persistence)?;
            ensure_updated(updated, id)
        })
        .await
    }

    async fn mark_checkpointed(
        &self,
        id: JobId,
        checkpoint_id: EventId,
        at: DateTime<Utc>,
    ) -> JobRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(agent_jobs::table.filter(agent_jobs::id.eq(id.into_inner())))
                .set((
                    agent_jobs::checkpoint_id.eq(Some(checkpoint_id.into_inner())),
                    agent_jobs::updated_at.eq(at),
                ))
                .execute(connection)
                .map_err(JobRepositoryError::persistence)?;
            ensure_updated(updated, id)
        })
        .await
    }

    async fn list_recent(&self, limit: usize) -> JobRepositoryResult<Vec<Job>> {
        let page = i64::try_from(limit).map_err(JobRepositoryError::persistence)?;
        self.run_blocking(move |connection| {
            let rows = agent_jobs::table
                .order((agent_jobs::due_at.desc(), agent_jobs::id.desc()))
                .limit(page)
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobRepositoryError::persistence)?;
            rows.into_iter().map(row_to_job).collect()
        })
        .await
    }
}

const fn ensure_updated(updated: usize, id: JobId) -> JobRepositoryResult<()> {
    if updated == 0 {
        return Err(JobRepositoryError::NotFound(id));
    }
    Ok(())
}

fn to_new_row(job: &Job) -> JobRepositoryResult<NewJobRow> {
    let scope = serde_json::to_value(job.scope()).map_err(JobRepositoryError::persistence)?;

    Ok(NewJobRow {
        id: job.id().into_inner(),
        job_type: job.job_type().as_str().to_owned(),
        status: job.status().as_str().to_owned(),
        scope,
        payload: job.payload().clone(),
        due_at: job.due_at(),
        created_at: job.created_at(),
        updated_at: job.updated_at(),
        resume_from: job.resume_from().map(EventId::into_inner),
        depends_on: job.depends_on().iter().copied().map(JobId::into_inner).collect(),
        requested_by: job.requested_by().map(str::to_owned),
        idempotency_key: job.idempotency_key().map(|key| key.as_str().to_owned()),
    })
}

fn row_to_job(row: JobRow) -> JobRepositoryResult<Job> {
    let JobRow {
        id,
        job_type: persisted_type,
        status: persisted_status,
        scope: persisted_scope,
        payload,
        due_at,
        created_at,
        updated_at,
        started_at,
        finished_at,
        error,
        result,
        checkpoint_id,
        resume_from,
        depends_on,
        requested_by,
        idempotency_key: persisted_key,
    } = row;

    let job_type = JobType::new(persisted_type).map_err(JobRepositoryError::persistence)?;
    let status =
        JobStatus::try_from(persisted_status.as_str()).map_err(JobRepositoryError::persistence)?;
    let scope = serde_json::from_value::<JobScope>(persisted_scope)
        .map_err(JobRepositoryError::persistence)?;
    let idempotency_key = persisted_key
        .map(IdempotencyKey::new)
        .transpose()
        .map_err(JobRepositoryError::persistence)?;

    Ok(Job::from_persisted(PersistedJobData {
        id: JobId::from_uuid(id),
        job_type,
        status,
        scope,
        payload,
        due_at,
        created_at,
        updated_at,
        started_at,
        finished_at,
        error,
        result,
        checkpoint_id: checkpoint_id.map(EventId::from_uuid),
        resume_from: resume_from.map(EventId::from_uuid),
        depends_on: depends_on.into_iter().map(JobId::from_uuid).collect(),
        requested_by,
        idempotency_key,
    }))
}
