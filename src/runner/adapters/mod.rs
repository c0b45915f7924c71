//! Command-line adapters for the runner's collaborator ports.

mod aws_cli;
mod command;
mod gh_cli;

pub use aws_cli::AwsCliInspector;
pub use gh_cli::GhCliHost;

#[cfg(test)]
pub(crate) use aws_cli::parse_rollout_state;
#[cfg(test)]
pub(crate) use gh_cli::{parse_checks, pull_request_from_url};
