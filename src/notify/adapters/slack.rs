//! Slack Web API notifier.

use crate::notify::ports::{ChatMessage, ChatNotifier, Delivery, NotifyError, NotifyResult};
use crate::secrets::{SecretCache, SecretSource};
use async_trait::async_trait;
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Secret holding the bot token.
pub const SLACK_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";

/// `chat.postMessage` endpoint.
pub const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_ts: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostMessageResponse {
    pub ok: bool,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Posts messages through Slack's `chat.postMessage`.
pub struct SlackNotifier<S, C>
where
    S: SecretSource,
    C: Clock + Send + Sync,
{
    client: reqwest::Client,
    secrets: Arc<SecretCache<S, C>>,
    endpoint: String,
}

impl<S, C> SlackNotifier<S, C>
where
    S: SecretSource,
    C: Clock + Send + Sync,
{
    /// Creates a notifier using the shared secret cache for its token.
    #[must_use]
    pub fn new(client: reqwest::Client, secrets: Arc<SecretCache<S, C>>) -> Self {
        Self {
            client,
            secrets,
            endpoint: SLACK_POST_MESSAGE_URL.to_owned(),
        }
    }

    /// Overrides the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl<S, C> ChatNotifier for SlackNotifier<S, C>
where
    S: SecretSource,
    C: Clock + Send + Sync,
{
    async fn post_message(&self, message: &ChatMessage) -> NotifyResult<Delivery> {
        let token = self.secrets.get(SLACK_BOT_TOKEN).await?;
        let request = PostMessageRequest {
            channel: &message.channel,
            text: &message.text,
            thread_ts: message.thread_ts.as_deref(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(NotifyError::transport)?
            .error_for_status()
            .map_err(NotifyError::transport)?
            .json::<PostMessageResponse>()
            .await
            .map_err(NotifyError::transport)?;
        Ok(delivery_from_response(&message.channel, response))
    }
}

pub(crate) fn delivery_from_response(channel: &str, response: PostMessageResponse) -> Delivery {
    if response.ok {
        return Delivery::delivered(response.ts);
    }
    warn!(
        channel,
        error = response.error.as_deref().unwrap_or("unknown"),
        "slack rejected message"
    );
    Delivery::skipped()
}
