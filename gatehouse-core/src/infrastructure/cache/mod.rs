//! Caching implementations
//!
//! Dragonfly backs the cache in multi-instance deployments. The in-memory
//! cache serves single-instance setups, fallback and tests.

pub mod dragonfly_cache;
pub mod memory_cache;

use async_trait::async_trait;
use std::time::Duration;

use crate::application::errors::ApplicationError;
use crate::application::services::CacheService;

pub use dragonfly_cache::DragonflyCache;
pub use memory_cache::MemoryCache;

/// Cache backend selected at startup
pub enum CacheBackend {
    Dragonfly(DragonflyCache),
    Memory(MemoryCache),
}

impl CacheBackend {
    pub fn backend_name(&self) -> &'static str {
        match self {
            CacheBackend::Dragonfly(_) => "dragonfly",
            CacheBackend::Memory(_) => "memory",
        }
    }
}

#[async_trait]
impl CacheService for CacheBackend {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        match self {
            CacheBackend::Dragonfly(cache) => cache.get(key).await,
            CacheBackend::Memory(cache) => cache.get(key).await,
        }
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: serde::Serialize + Send + Sync,
    {
        match self {
            CacheBackend::Dragonfly(cache) => cache.set(key, value, ttl).await,
            CacheBackend::Memory(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn set_if_absent<T>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<bool, ApplicationError>
    where
        T: serde::Serialize + Send + Sync,
    {
        match self {
            CacheBackend::Dragonfly(cache) => cache.set_if_absent(key, value, ttl).await,
            CacheBackend::Memory(cache) => cache.set_if_absent(key, value, ttl).await,
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, ApplicationError> {
        match self {
            CacheBackend::Dragonfly(cache) => cache.exists(key).await,
            CacheBackend::Memory(cache) => cache.exists(key).await,
        }
    }

    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError> {
        match self {
            CacheBackend::Dragonfly(cache) => cache.invalidate(key).await,
            CacheBackend::Memory(cache) => cache.invalidate(key).await,
        }
    }
}
