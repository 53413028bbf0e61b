//! Service traits consumed by the application layer

use async_trait::async_trait;
use std::time::Duration;

use crate::application::errors::ApplicationError;

/// Key-value cache with per-entry expiry.
///
/// Values are stored as JSON. Implemented by the Dragonfly and in-memory
/// backends in `infrastructure::cache`.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Get a cached value, `None` on miss
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: serde::de::DeserializeOwned + Send;

    /// Set a value with a TTL
    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: serde::Serialize + Send + Sync;

    /// Set a value only if the key is absent. Returns `true` when this call wrote it.
    async fn set_if_absent<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<bool, ApplicationError>
    where
        T: serde::Serialize + Send + Sync;

    /// Check whether a live entry exists
    async fn exists(&self, key: &str) -> Result<bool, ApplicationError>;

    /// Remove an entry
    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError>;
}
