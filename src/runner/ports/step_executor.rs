//! Single-step execution for multi-step agent runs.

use super::CollaboratorResult;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Input for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRequest<'a> {
    /// Zero-based step number.
    pub step: u64,
    /// RFPs the run works on.
    pub rfp_ids: &'a [String],
    /// Accumulated progress from earlier steps.
    pub state: &'a Map<String, Value>,
}

/// Output of one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Step output, appended to the intermediate results.
    pub output: Value,
    /// Tool calls made during the step.
    pub tool_calls: Vec<Value>,
    /// Entries merged into the accumulated progress.
    pub state_updates: Map<String, Value>,
    /// `true` when the run has nothing left to do.
    pub done: bool,
}

/// Executes one step of an agent run.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Runs `request` and reports its result.
    async fn execute_step(&self, request: StepRequest<'_>) -> CollaboratorResult<StepResult>;
}
