//! [`DeploymentInspector`] backed by the AWS CLI.

use super::command::{capture, failed};
use crate::runner::ports::{
    CollaboratorError, CollaboratorResult, DeploymentInspector, DeploymentTarget, RolloutState,
};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

const PROGRAM: &str = "aws";

/// Reads ECS rollout state with `aws ecs describe-services`.
#[derive(Debug, Clone, Default)]
pub struct AwsCliInspector {
    region: Option<String>,
}

impl AwsCliInspector {
    /// Creates an inspector using the CLI's configured region.
    #[must_use]
    pub const fn new() -> Self {
        Self { region: None }
    }

    /// Pins the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[async_trait]
impl DeploymentInspector for AwsCliInspector {
    async fn rollout_state(&self, target: &DeploymentTarget) -> CollaboratorResult<RolloutState> {
        let mut command = Command::new(PROGRAM);
        command.args([
            "ecs",
            "describe-services",
            "--cluster",
            &target.cluster,
            "--services",
            &target.service,
            "--output",
            "json",
        ]);
        if let Some(region) = &self.region {
            command.arg("--region").arg(region);
        }
        let output = capture(PROGRAM, &mut command).await?;
        if !output.status.success() {
            return Err(failed(PROGRAM, &output));
        }
        parse_rollout_state(&String::from_utf8_lossy(&output.stdout), &target.service)
    }
}

#[derive(Debug, Deserialize)]
struct DescribeServices {
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    failures: Vec<Failure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Service {
    service_name: String,
    #[serde(default)]
    deployments: Vec<Deployment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Deployment {
    status: String,
    rollout_state: Option<String>,
    rollout_state_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Failure {
    reason: Option<String>,
}

/// Maps `describe-services` output to the rollout state of the primary
/// deployment of `service`.
pub(crate) fn parse_rollout_state(json: &str, service: &str) -> CollaboratorResult<RolloutState> {
    let malformed = |reason: String| CollaboratorError::Malformed {
        source_name: PROGRAM.to_owned(),
        reason,
    };
    let described: DescribeServices =
        serde_json::from_str(json).map_err(|err| malformed(err.to_string()))?;
    let Some(found) = described
        .services
        .iter()
        .find(|candidate| candidate.service_name == service)
    else {
        let reason = described
            .failures
            .iter()
            .find_map(|failure| failure.reason.clone())
            .unwrap_or_else(|| "service not found".to_owned());
        return Err(malformed(format!("{service}: {reason}")));
    };
    let primary = found
        .deployments
        .iter()
        .find(|deployment| deployment.status == "PRIMARY")
        .ok_or_else(|| malformed(format!("{service}: no primary deployment")))?;
    Ok(match primary.rollout_state.as_deref() {
        Some("COMPLETED") => RolloutState::Completed,
        Some("FAILED") => RolloutState::Failed(
            primary
                .rollout_state_reason
                .clone()
                .unwrap_or_else(|| "rollout failed".to_owned()),
        ),
        _ if found.deployments.len() == 1 && primary.rollout_state.is_none() => {
            RolloutState::Completed
        }
        _ => RolloutState::InProgress,
    })
}
