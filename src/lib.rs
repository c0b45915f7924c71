//! Bidforge: durable agent job runner.
//!
//! This crate provides the scheduling core of a proposal management
//! backend: a job queue with atomic claiming, a registry of job handlers, a
//! time-boxed runner that checkpoints long work and continues it in fresh
//! jobs, and the append-only event log that stores both the audit trail and
//! the checkpoints.
//!
//! # Architecture
//!
//! Bidforge follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, CLIs, chat)
//!
//! # Modules
//!
//! - [`job`]: Job aggregate, due-time index, and atomic claim
//! - [`event`]: Append-only event log
//! - [`checkpoint`]: Checkpoint store and resume state
//! - [`runner`]: Handler registry, built-in handlers, and the drain loop
//! - [`notify`]: Chat and mail delivery
//! - [`secrets`]: Owned secret cache
//! - [`config`]: Runner configuration

pub mod checkpoint;
pub mod config;
pub mod event;
pub mod job;
pub mod notify;
pub mod runner;
pub mod secrets;

#[cfg(test)]
mod test_support;
