//! Adapter implementations for event log ports.

pub mod memory;
pub mod postgres;
