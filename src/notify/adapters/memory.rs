//! Recording notifier for tests and dry runs.

use crate::notify::ports::{
    ChatMessage, ChatNotifier, Delivery, MailMessage, MailSender, NotifyError, NotifyResult,
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Keeps every chat message and email it is asked to deliver.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<Recorded>>,
    reject: bool,
}

#[derive(Debug, Default)]
struct Recorded {
    chat: Vec<ChatMessage>,
    mail: Vec<MailMessage>,
}

impl RecordingNotifier {
    /// Creates a notifier that accepts every delivery.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier that records deliveries but reports them as not
    /// accepted.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Returns recorded chat messages in delivery order.
    #[must_use]
    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.state
            .read()
            .map(|guard| guard.chat.clone())
            .unwrap_or_default()
    }

    /// Returns recorded emails in delivery order.
    #[must_use]
    pub fn mail_messages(&self) -> Vec<MailMessage> {
        self.state
            .read()
            .map(|guard| guard.mail.clone())
            .unwrap_or_default()
    }

    fn record(&self, apply: impl FnOnce(&mut Recorded) -> usize) -> NotifyResult<Delivery> {
        let mut state = self
            .state
            .write()
            .map_err(|err| NotifyError::transport(std::io::Error::other(err.to_string())))?;
        let sequence = apply(&mut state);
        if self.reject {
            return Ok(Delivery::skipped());
        }
        Ok(Delivery::delivered(Some(format!("recorded-{sequence}"))))
    }
}

#[async_trait]
impl ChatNotifier for RecordingNotifier {
    async fn post_message(&self, message: &ChatMessage) -> NotifyResult<Delivery> {
        self.record(|state| {
            state.chat.push(message.clone());
            state.chat.len()
        })
    }
}

#[async_trait]
impl MailSender for RecordingNotifier {
    async fn send_plain_text(&self, message: &MailMessage) -> NotifyResult<Delivery> {
        self.record(|state| {
            state.mail.push(message.clone());
            state.mail.len()
        })
    }
}
