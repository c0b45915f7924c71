//! Shared error type for external collaborators.

use std::sync::Arc;
use thiserror::Error;

/// Result type for collaborator calls.
pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Errors raised by external tools and services.
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    /// A command ran and reported failure.
    #[error("{program} failed: {message}")]
    CommandFailed {
        /// Program name.
        program: String,
        /// Captured diagnostic output.
        message: String,
    },

    /// The collaborator returned output that could not be understood.
    #[error("unexpected response from {source_name}: {reason}")]
    Malformed {
        /// Collaborator name.
        source_name: String,
        /// What was wrong.
        reason: String,
    },

    /// The collaborator could not be reached at all.
    #[error("collaborator unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl CollaboratorError {
    /// Wraps an I/O or transport failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
