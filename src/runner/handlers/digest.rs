//! `agent_daily_digest`: email a summary of recent activity, then
//! reschedule.

use super::DAILY_DIGEST;
use crate::event::{
    ports::EventLogRepository,
    services::{EventLogService, MAX_LIST_LIMIT},
};
use crate::job::domain::{
    JobType,
    timestamp::{before, minutes, sortable_timestamp},
};
use crate::notify::ports::{MailMessage, MailSender};
use crate::runner::{
    domain::{Completion, FollowUp, JobContext, JobOutcome, Payload},
    ports::{HandlerError, JobHandler},
};
use async_trait::async_trait;
use minijinja::{Environment, context};
use mockable::Clock;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_HOURS: u64 = 24;

const DIGEST_TEMPLATE: &str = "Activity since {{ since }} ({{ hours }}h): {{ total }} event\
{% if total != 1 %}s{% endif %}.
{% for event_type, count in counts|items %}
- {{ event_type }}: {{ count }}{% endfor %}
";

/// Emails a count of recent events by type and schedules the next digest.
///
/// Payload: `{hours?, rescheduleMinutes?, to?}`. `hours` defaults to 24 and
/// the next run is due `rescheduleMinutes` later, defaulting to `hours`.
pub struct DailyDigestHandler<E, C>
where
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    events: EventLogService<E, C>,
    mail: Arc<dyn MailSender>,
    default_recipients: Vec<String>,
}

impl<E, C> DailyDigestHandler<E, C>
where
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates the handler.
    #[must_use]
    pub const fn new(events: Arc<E>, clock: Arc<C>, mail: Arc<dyn MailSender>) -> Self {
        Self {
            events: EventLogService::new(events, clock),
            mail,
            default_recipients: Vec::new(),
        }
    }

    /// Sets recipients used when the payload names none.
    #[must_use]
    pub fn with_default_recipients(mut self, recipients: Vec<String>) -> Self {
        self.default_recipients = recipients;
        self
    }
}

#[async_trait]
impl<E, C> JobHandler for DailyDigestHandler<E, C>
where
    E: EventLogRepository,
    C: Clock + Send + Sync,
{
    fn job_type(&self) -> JobType {
        JobType::from_static(DAILY_DIGEST)
    }

    async fn handle(&self, context: &JobContext) -> Result<JobOutcome, HandlerError> {
        let job = context.job();
        let payload = Payload::new(job.payload())?;
        let hours = payload.u64_or("hours", DEFAULT_HOURS)?.max(1);
        let reschedule_minutes = payload.u64_or("rescheduleMinutes", hours.saturating_mul(60))?;
        let listed = payload.string_list("to")?;
        let recipients = if listed.is_empty() {
            self.default_recipients.clone()
        } else {
            listed
        };

        let since = before(context.now(), minutes(hours.saturating_mul(60)));
        let events = self.events.list_recent_global(since, MAX_LIST_LIMIT).await?;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for event in &events {
            *counts.entry(event.event_type().as_str().to_owned()).or_default() += 1;
        }

        let body = Environment::new()
            .render_str(
                DIGEST_TEMPLATE,
                context! {
                    since => sortable_timestamp(since),
                    hours => hours,
                    total => events.len(),
                    counts => &counts,
                },
            )?;

        let delivered = if recipients.is_empty() {
            info!(job_id = %job.id(), "no digest recipients configured; skipping email");
            false
        } else {
            let message = MailMessage {
                to: recipients.clone(),
                subject: format!("Agent digest: last {hours}h"),
                body,
            };
            match self.mail.send_plain_text(&message).await {
                Ok(delivery) => delivery.ok,
                Err(err) => {
                    warn!(job_id = %job.id(), error = %err, "digest email failed");
                    false
                }
            }
        };

        let result = json!({
            "eventsSummarized": events.len(),
            "recipients": recipients,
            "delivered": delivered,
        });
        Ok(Completion::new(result)
            .then(FollowUp::same_type(
                job.payload().clone(),
                minutes(reschedule_minutes),
            ))
            .into())
    }
}
