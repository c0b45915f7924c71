//! Checkpoint store.
//!
//! Long-running handlers persist their progress as immutable `checkpoint`
//! events so that a continuation job can pick up where the previous attempt
//! stopped. The module provides:
//!
//! - [`domain`]: drafts, stored records, resume state, validation, and the
//!   dual-trigger checkpoint policy
//! - [`services`]: [`services::CheckpointStore`] over any event log

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
