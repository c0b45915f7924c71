//! Chat and mail delivery contracts.

use crate::secrets::SecretError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Outcome reported by a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Whether the channel accepted the message.
    pub ok: bool,
    /// Channel-assigned message identifier.
    pub id: Option<String>,
}

impl Delivery {
    /// A delivery the channel accepted.
    #[must_use]
    pub const fn delivered(id: Option<String>) -> Self {
        Self { ok: true, id }
    }

    /// A delivery that did not happen.
    #[must_use]
    pub const fn skipped() -> Self {
        Self { ok: false, id: None }
    }
}

/// A chat message addressed to a channel, optionally in a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Destination channel.
    pub channel: String,
    /// Parent thread timestamp.
    pub thread_ts: Option<String>,
    /// Message body.
    pub text: String,
}

impl ChatMessage {
    /// Creates a top-level message.
    #[must_use]
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            thread_ts: None,
            text: text.into(),
        }
    }

    /// Replies in a thread.
    #[must_use]
    pub fn in_thread(mut self, thread_ts: Option<String>) -> Self {
        self.thread_ts = thread_ts;
        self
    }
}

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Recipients.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
}

/// Posts messages to a chat workspace.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Posts `message`.
    async fn post_message(&self, message: &ChatMessage) -> NotifyResult<Delivery>;
}

/// Sends plain-text email.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Sends `message`.
    async fn send_plain_text(&self, message: &MailMessage) -> NotifyResult<Delivery>;
}

/// Errors raised while delivering notifications.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// Credentials could not be loaded.
    #[error(transparent)]
    Secret(#[from] SecretError),

    /// The transport failed.
    #[error("notification transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotifyError {
    /// Wraps a transport failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
