//! Durable job queue.
//!
//! Jobs are created by any producer (a self-rescheduling handler, the runner
//! continuing a checkpointed job, an external scheduler), found through a
//! due-time index, claimed with an atomic `queued → running` swap, and
//! finished as completed or failed. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
