//! Port contracts for the event log.

pub mod repository;

pub use repository::{EventLogError, EventLogRepository, EventLogResult};
