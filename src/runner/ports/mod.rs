//! Port contracts used by the runner and its handlers.

pub mod collaborator;
pub mod deployment;
pub mod handler;
pub mod pull_request;
pub mod step_executor;

pub use collaborator::{CollaboratorError, CollaboratorResult};
pub use deployment::{DeploymentInspector, DeploymentTarget, RolloutState};
pub use handler::{HandlerError, JobHandler};
pub use pull_request::{
    ChangeProposal, ChecksReport, ChecksState, PullRequestHost, PullRequestRef,
};
pub use step_executor::{StepExecutor, StepRequest, StepResult};
