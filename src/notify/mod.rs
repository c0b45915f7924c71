//! Outbound notifications.
//!
//! Handlers and the runner report to people through [`ports::ChatNotifier`]
//! and [`ports::MailSender`]. Delivery problems are reported back as values
//! and never abort a run.

pub mod adapters;
pub mod ports;

#[cfg(test)]
mod tests;
