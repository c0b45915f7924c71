//! Append-only event log.
//!
//! Every notable action (a checkpoint, a terminal job failure, a run
//! summary) is recorded as an immutable event in a scope partition. Events
//! are never updated or deleted; checkpoints live here as events of type
//! `checkpoint`.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
