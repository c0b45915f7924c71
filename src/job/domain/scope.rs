//! Key-value context describing which business entity a job concerns.

use crate::event::domain::ScopeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scope keys consulted, in order, when resolving a job's scope identifier.
const SCOPE_ID_KEYS: [&str; 3] = ["opportunityId", "rfpId", "scopeId"];

/// Key-value context attached to a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobScope(BTreeMap<String, String>);

impl JobScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a scope entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` when no entries are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over scope entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Resolves the scope identifier used to partition events and
    /// checkpoints.
    ///
    /// Falls back to the global scope when none of `opportunityId`, `rfpId`
    /// or `scopeId` carry a usable value.
    #[must_use]
    pub fn scope_id(&self) -> ScopeId {
        SCOPE_ID_KEYS
            .iter()
            .filter_map(|key| self.get(key))
            .find_map(|value| ScopeId::new(value).ok())
            .unwrap_or_else(ScopeId::global)
    }
}

impl FromIterator<(String, String)> for JobScope {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
