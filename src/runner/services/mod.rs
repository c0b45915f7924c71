//! Runner services: the handler registry, the drain loop, and summary
//! rendering.

mod registry;
mod report;
mod runner;

pub use registry::{DuplicateHandler, HandlerRegistry};
pub use report::render_summary;
pub use runner::{JobRunner, RUNNER_ACTOR, RunnerError, RunnerResult};
