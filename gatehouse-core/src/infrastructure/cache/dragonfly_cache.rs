//! Dragonfly database cache implementation
//!
//! Dragonfly speaks the Redis protocol, so the `redis` crate's connection
//! manager is used as-is. Every command is bounded by the configured
//! operation timeout.
// cspell:ignore Dragonfly

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::application::errors::{ApplicationError, CacheError};
use crate::application::services::CacheService;

/// Dragonfly database cache implementation
#[derive(Clone)]
pub struct DragonflyCache {
    connection_manager: ConnectionManager,
    operation_timeout: Duration,
}

impl DragonflyCache {
    /// Connect to Dragonfly and verify the connection with a PING
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established within
    /// `connect_timeout`
    pub async fn new(
        url: &str,
        connect_timeout: Duration,
        operation_timeout: Duration,
    ) -> Result<Self, ApplicationError> {
        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            CacheError::Backend(format!("invalid Dragonfly URL: {}", e))
        })?;

        let connect = async {
            let mut manager = ConnectionManager::new(client).await?;
            redis::cmd("PING").query_async::<String>(&mut manager).await?;
            Ok::<_, redis::RedisError>(manager)
        };

        let connection_manager = tokio::time::timeout(connect_timeout, connect)
            .await
            .map_err(|_| CacheError::Timeout {
                timeout_ms: connect_timeout.as_millis() as u64,
            })?
            .map_err(|e| {
                error!("Failed to connect to the Dragonfly database: {}", e);
                CacheError::Backend(format!("failed to connect to Dragonfly: {}", e))
            })?;

        debug!("Successfully connected to the Dragonfly database at {}", url);

        Ok(Self {
            connection_manager,
            operation_timeout,
        })
    }

    /// Run one command against a cloned connection, bounded by the operation timeout
    async fn run<T, F, Fut>(&self, op: &'static str, key: &str, f: F) -> Result<T, ApplicationError>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let conn = self.connection_manager.clone();
        match tokio::time::timeout(self.operation_timeout, f(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(key = %key, "Redis {} error: {}", op, e);
                Err(CacheError::Backend(format!("Redis {} error: {}", op, e)).into())
            }
            Err(_) => {
                let timeout_ms = self.operation_timeout.as_millis() as u64;
                warn!(key = %key, timeout_ms, "Redis {} timed out", op);
                Err(CacheError::Timeout { timeout_ms }.into())
            }
        }
    }

    /// Millisecond TTL for PX, at least 1
    fn ttl_millis(ttl: Duration) -> u64 {
        (ttl.as_millis() as u64).max(1)
    }
}

#[async_trait]
impl CacheService for DragonflyCache {
    async fn get<T>(&self, key: &str) -> Result<Option<T>, ApplicationError>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let raw: Option<Vec<u8>> = self
            .run("GET", key, |mut conn| async move {
                redis::cmd("GET").arg(key).query_async(&mut conn).await
            })
            .await?;

        match raw {
            Some(data) => {
                let value = serde_json::from_slice(&data)?;
                debug!("Cache hit for key: {}", key);
                Ok(Some(value))
            }
            None => {
                debug!("Cache miss for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), ApplicationError>
    where
        T: serde::Serialize + Send + Sync,
    {
        let data = serde_json::to_vec(value)?;
        let ttl_ms = Self::ttl_millis(ttl);

        self.run("SET", key, |mut conn| async move {
            redis::cmd("SET")
                .arg(key)
                .arg(data)
                .arg("PX")
                .arg(ttl_ms)
                .query_async::<()>(&mut conn)
                .await
        })
        .await?;

        debug!("Cached entry for key: {} with TTL: {}ms", key, ttl_ms);
        Ok(())
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
        let data = serde_json::to_vec(value)?;
        let ttl_ms = Self::ttl_millis(ttl);

        // SET NX replies nil when the key already exists
        let reply: Option<String> = self
            .run("SET NX", key, |mut conn| async move {
                redis::cmd("SET")
                    .arg(key)
                    .arg(data)
                    .arg("NX")
                    .arg("PX")
                    .arg(ttl_ms)
                    .query_async(&mut conn)
                    .await
            })
            .await?;

        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, ApplicationError> {
        let count: i64 = self
            .run("EXISTS", key, |mut conn| async move {
                redis::cmd("EXISTS").arg(key).query_async(&mut conn).await
            })
            .await?;
        Ok(count > 0)
    }

    async fn invalidate(&self, key: &str) -> Result<(), ApplicationError> {
        let deleted: i64 = self
            .run("DEL", key, |mut conn| async move {
                redis::cmd("DEL").arg(key).query_async(&mut conn).await
            })
            .await?;

        if deleted > 0 {
            debug!("Invalidated cache key: {}", key);
        } else {
            debug!("Cache key not found for invalidation: {}", key);
        }
        Ok(())
    }
}
