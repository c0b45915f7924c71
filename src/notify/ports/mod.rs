//! Outbound notification ports.

pub mod chat;

pub use chat::{ChatMessage, ChatNotifier, Delivery, MailMessage, MailSender, NotifyError, NotifyResult};
