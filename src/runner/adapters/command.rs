//! Subprocess plumbing shared by the CLI adapters.

use crate::runner::ports::{CollaboratorError, CollaboratorResult};
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Runs `command` to completion, capturing its output.
///
/// A spawn failure is [`CollaboratorError::Unavailable`]; a non-zero exit
/// is left for the caller to judge because some tools report state through
/// the exit code.
pub(super) async fn capture(program: &str, command: &mut Command) -> CollaboratorResult<Output> {
    let output = command
        .kill_on_drop(true)
        .output()
        .await
        .map_err(CollaboratorError::unavailable)?;
    debug!(program, status = ?output.status.code(), "command finished");
    Ok(output)
}

/// Builds [`CollaboratorError::CommandFailed`] from captured stderr.
pub(super) fn failed(program: &str, output: &Output) -> CollaboratorError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = match stderr.trim() {
        "" => format!("exit status {:?}", output.status.code()),
        text => text.to_owned(),
    };
    CollaboratorError::CommandFailed {
        program: program.to_owned(),
        message,
    }
}
