//! Persistence adapters for the job module.
//!
//! - [`memory::InMemoryJobRepository`]: thread-safe storage for tests
//! - [`postgres::PostgresJobRepository`]: `PostgreSQL` persistence using
//!   Diesel, with the claim expressed as a conditional `UPDATE`

pub mod memory;
pub mod postgres;
