//! In-memory job adapter for tests and local runs.

mod job;

pub use job::InMemoryJobRepository;
