//! Owned secret cache with a time-to-live.
//!
//! A [`SecretCache`] is built once per process and handed to the adapters
//! that need credentials. Values are fetched from a [`SecretSource`] on
//! first use and reused until the TTL lapses.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

/// Default lifetime of a cached secret, in seconds.
pub const DEFAULT_SECRET_TTL_SECS: i64 = 300;

/// Result type for secret lookups.
pub type SecretResult<T> = Result<T, SecretError>;

/// Errors returned by secret sources and the cache.
#[derive(Debug, Clone, Error)]
pub enum SecretError {
    /// The source has no value for the name.
    #[error("secret '{0}' is not configured")]
    Missing(String),

    /// The source failed.
    #[error("secret source error: {0}")]
    Source(Arc<dyn std::error::Error + Send + Sync>),

    /// The cache lock was poisoned.
    #[error("secret cache lock poisoned: {0}")]
    Poisoned(String),
}

impl SecretError {
    /// Wraps a source failure.
    pub fn source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source(Arc::new(err))
    }
}

/// Where secret values come from.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetches the current value of `name`, or `None` when it is unset.
    async fn fetch(&self, name: &str) -> SecretResult<Option<String>>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretSource;

#[async_trait]
impl SecretSource for EnvSecretSource {
    async fn fetch(&self, name: &str) -> SecretResult<Option<String>> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(SecretError::source(err)),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSecret {
    value: String,
    fetched_at: DateTime<Utc>,
}

/// TTL cache in front of a [`SecretSource`].
pub struct SecretCache<S, C>
where
    S: SecretSource,
    C: Clock + Send + Sync,
{
    source: S,
    clock: Arc<C>,
    ttl: TimeDelta,
    entries: RwLock<HashMap<String, CachedSecret>>,
}

impl<S, C> SecretCache<S, C>
where
    S: SecretSource,
    C: Clock + Send + Sync,
{
    /// Creates a cache with the default five-minute TTL.
    #[must_use]
    pub fn new(source: S, clock: Arc<C>) -> Self {
        Self::with_ttl(source, clock, TimeDelta::seconds(DEFAULT_SECRET_TTL_SECS))
    }

    /// Creates a cache with an explicit TTL.
    #[must_use]
    pub fn with_ttl(source: S, clock: Arc<C>, ttl: TimeDelta) -> Self {
        Self {
            source,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the value of `name`, fetching it when absent or expired.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Missing`] when the source has no value, or the
    /// source's own error.
    pub async fn get(&self, name: &str) -> SecretResult<String> {
        let now = self.clock.utc();
        if let Some(value) = self.fresh(name, now)? {
            return Ok(value);
        }

        let value = self
            .source
            .fetch(name)
            .await?
            .ok_or_else(|| SecretError::Missing(name.to_owned()))?;
        debug!(secret = name, "secret refreshed");

        let mut entries = self
            .entries
            .write()
            .map_err(|err| SecretError::Poisoned(err.to_string()))?;
        entries.insert(
            name.to_owned(),
            CachedSecret {
                value: value.clone(),
                fetched_at: now,
            },
        );
        Ok(value)
    }

    /// Drops a cached value so the next read refetches it.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::Poisoned`] when the cache lock is poisoned.
    pub fn invalidate(&self, name: &str) -> SecretResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| SecretError::Poisoned(err.to_string()))?;
        entries.remove(name);
        Ok(())
    }

    fn fresh(&self, name: &str, now: DateTime<Utc>) -> SecretResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|err| SecretError::Poisoned(err.to_string()))?;
        Ok(entries
            .get(name)
            .filter(|cached| now.signed_duration_since(cached.fetched_at) < self.ttl)
            .map(|cached| cached.value.clone()))
    }
}
