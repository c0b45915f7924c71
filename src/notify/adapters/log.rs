//! Fallback notifier that only logs.

use crate::notify::ports::{
    ChatMessage, ChatNotifier, Delivery, MailMessage, MailSender, NotifyResult,
};
use async_trait::async_trait;
use tracing::info;

/// Writes notifications to the log instead of delivering them.
///
/// Every delivery reports `ok = false` so callers can tell nothing left the
/// process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ChatNotifier for LogNotifier {
    async fn post_message(&self, message: &ChatMessage) -> NotifyResult<Delivery> {
        info!(
            channel = %message.channel,
            thread_ts = ?message.thread_ts,
            text = %message.text,
            "chat delivery not configured; message logged"
        );
        Ok(Delivery::skipped())
    }
}

#[async_trait]
impl MailSender for LogNotifier {
    async fn send_plain_text(&self, message: &MailMessage) -> NotifyResult<Delivery> {
        info!(
            to = ?message.to,
            subject = %message.subject,
            body_chars = message.body.chars().count(),
            "mail delivery not configured; message logged"
        );
        Ok(Delivery::skipped())
    }
}
