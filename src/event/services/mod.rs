//! Service layer for the event log.

mod log;

pub use log::{EventLogService, MAX_LIST_LIMIT};
