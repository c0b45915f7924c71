//! Container deployment inspection used by rollout verification.

use super::CollaboratorResult;
use async_trait::async_trait;

/// Service whose rollout is being verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Cluster name.
    pub cluster: String,
    /// Service name.
    pub service: String,
}

/// State of the primary deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloutState {
    /// New tasks are still being placed.
    InProgress,
    /// The deployment reached steady state.
    Completed,
    /// The deployment failed or was rolled back.
    Failed(String),
}

/// Reads deployment state from the container platform.
#[async_trait]
pub trait DeploymentInspector: Send + Sync {
    /// Returns the rollout state of the service's primary deployment.
    async fn rollout_state(&self, target: &DeploymentTarget) -> CollaboratorResult<RolloutState>;
}
