//! Job runner.
//!
//! One call to [`services::JobRunner::run_once`] drains due jobs in
//! batches. Each claimed job is dispatched through the
//! [`services::HandlerRegistry`] to a [`ports::JobHandler`], which reports a
//! [`domain::JobOutcome`]: completion (optionally scheduling a follow-up
//! job), suspension before the time budget runs out, or a recoverable or
//! fatal failure. Suspended and recoverable jobs are checkpointed and
//! continued in a fresh job that resumes from the checkpoint.
//!
//! Built-in handlers live in [`handlers`]; the command-line collaborators
//! they use in production live in [`adapters`].

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
