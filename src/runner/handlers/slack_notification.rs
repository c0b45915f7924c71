//! `slack_notification`: deliver one chat message.

use super::SLACK_NOTIFICATION;
use crate::job::domain::JobType;
use crate::notify::ports::{ChatMessage, ChatNotifier};
use crate::runner::{
    domain::{JobContext, JobOutcome, Payload},
    ports::{HandlerError, JobHandler},
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Posts `{channelId, threadTs?, text}` to the chat workspace.
///
/// A rejected post is reported as recoverable; with no progress to save the
/// runner records the job as failed.
pub struct SlackNotificationHandler {
    chat: Arc<dyn ChatNotifier>,
}

impl SlackNotificationHandler {
    /// Creates the handler.
    #[must_use]
    pub const fn new(chat: Arc<dyn ChatNotifier>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl JobHandler for SlackNotificationHandler {
    fn job_type(&self) -> JobType {
        JobType::from_static(SLACK_NOTIFICATION)
    }

    async fn handle(&self, context: &JobContext) -> Result<JobOutcome, HandlerError> {
        let payload = Payload::new(context.job().payload())?;
        let channel = payload.required_str("channelId")?;
        let text = payload.required_str("text")?;
        let thread_ts = payload.optional_str("threadTs")?.map(str::to_owned);

        let message = ChatMessage::new(channel, text).in_thread(thread_ts);
        let delivery = self.chat.post_message(&message).await?;
        if !delivery.ok {
            return Ok(JobOutcome::recoverable(format!(
                "slack_post_failed:{channel}"
            )));
        }
        Ok(JobOutcome::completed(json!({
            "channelId": channel,
            "ts": delivery.id,
        })))
    }
}
