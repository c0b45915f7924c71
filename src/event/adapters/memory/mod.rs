//! In-memory event log adapter.

mod event;

pub use event::InMemoryEventLog;
