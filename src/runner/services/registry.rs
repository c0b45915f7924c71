//! Job type to handler lookup.

use crate::job::domain::JobType;
use crate::runner::ports::JobHandler;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Error raised when two handlers claim the same job type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("a handler is already registered for job type '{0}'")]
pub struct DuplicateHandler(pub String);

/// Maps job types to their handlers.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<JobType, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under its own job type.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateHandler`] when the type is already taken.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) -> Result<(), DuplicateHandler> {
        let job_type = handler.job_type();
        if self.handlers.contains_key(&job_type) {
            return Err(DuplicateHandler(job_type.as_str().to_owned()));
        }
        self.handlers.insert(job_type, handler);
        Ok(())
    }

    /// Registers `handler`, returning the registry for chaining.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateHandler`] when the type is already taken.
    pub fn with(mut self, handler: Arc<dyn JobHandler>) -> Result<Self, DuplicateHandler> {
        self.register(handler)?;
        Ok(self)
    }

    /// Looks up the handler for `job_type`.
    #[must_use]
    pub fn get(&self, job_type: &JobType) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(job_type).cloned()
    }

    /// Returns the registered job types, sorted.
    #[must_use]
    pub fn job_types(&self) -> Vec<JobType> {
        let mut types: Vec<JobType> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
