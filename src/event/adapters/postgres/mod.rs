//! `PostgreSQL` adapters for the event log.

mod models;
mod repository;
mod schema;

pub use repository::{EventPgPool, PostgresEventLog};
