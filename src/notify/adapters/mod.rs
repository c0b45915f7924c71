//! Notification adapters.

mod log;
mod memory;
mod slack;

pub use log::LogNotifier;
pub use memory::RecordingNotifier;
pub use slack::{SLACK_BOT_TOKEN, SLACK_POST_MESSAGE_URL, SlackNotifier};

#[cfg(test)]
pub(crate) use slack::{PostMessageResponse, delivery_from_response};
