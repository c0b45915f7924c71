//! `agent_state_refresh`: aggregate recent job outcomes into an event.

use super::STATE_REFRESH;
use crate::event::{
    domain::{EventType, NewEvent, ScopeId},
    ports::EventLogRepository,
    services::EventLogService,
};
use crate::job::{
    domain::{
        JobType,
        timestamp::{before, minutes, sortable_timestamp},
    },
    ports::JobRepository,
    services::{JobQueueService, MAX_CLAIM_LIMIT},
};
use crate::runner::{
    domain::{Completion, FollowUp, JobContext, JobOutcome, Payload},
    ports::{HandlerError, JobHandler},
};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

const DEFAULT_HOURS: u64 = 24;
const DEFAULT_RESCHEDULE_MINUTES: u64 = 60;

/// Counts jobs touched in the last `hours` by status and type, records the
/// counts as a `state_refresh` event in the global scope, and reschedules.
///
/// Payload: `{hours?, rescheduleMinutes?}` (defaults 24 and 60).
pub struct StateRefreshHandler<J, E, C>
where
    J: JobRepository,
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    jobs: JobQueueService<J, C>,
    events: EventLogService<E, C>,
}

impl<J, E, C> StateRefreshHandler<J, E, C>
where
    J: JobRepository,
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates the handler.
    #[must_use]
    pub fn new(jobs: Arc<J>, events: Arc<E>, clock: Arc<C>) -> Self {
        Self {
            jobs: JobQueueService::new(jobs, Arc::clone(&clock)),
            events: EventLogService::new(events, clock),
        }
    }
}

#[async_trait]
impl<J, E, C> JobHandler for StateRefreshHandler<J, E, C>
where
    J: JobRepository,
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    fn job_type(&self) -> JobType {
        JobType::from_static(STATE_REFRESH)
    }

    async fn handle(&self, context: &JobContext) -> Result<JobOutcome, HandlerError> {
        let job = context.job();
        let payload = Payload::new(job.payload())?;
        let hours = payload.u64_or("hours", DEFAULT_HOURS)?.max(1);
        let reschedule_minutes =
            payload.u64_or("rescheduleMinutes", DEFAULT_RESCHEDULE_MINUTES)?;

        let since = before(context.now(), minutes(hours.saturating_mul(60)));
        let recent = self.jobs.list_recent(MAX_CLAIM_LIMIT, None).await?;
        let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut total = 0_usize;
        for entry in recent
            .iter()
            .filter(|entry| entry.id() != job.id() && entry.updated_at() >= since)
        {
            total += 1;
            *by_status.entry(entry.status().as_str()).or_default() += 1;
            *by_type.entry(entry.job_type().as_str().to_owned()).or_default() += 1;
        }

        let aggregate = json!({
            "hours": hours,
            "since": sortable_timestamp(since),
            "total": total,
            "byStatus": by_status,
            "byType": by_type,
        });
        let event = self
            .events
            .append(
                NewEvent::new(
                    ScopeId::global(),
                    EventType::from_static(EventType::STATE_REFRESH),
                    aggregate.clone(),
                )
                .with_created_by(STATE_REFRESH),
            )
            .await?;

        let result = json!({ "eventId": event.id().to_string(), "summary": aggregate });
        Ok(Completion::new(result)
            .then(FollowUp::same_type(
                job.payload().clone(),
                minutes(reschedule_minutes),
            ))
            .into())
    }
}
