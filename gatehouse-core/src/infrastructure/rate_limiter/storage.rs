//! Rate Limit Storage Backends
//!
//! Provides storage implementations for token bucket state:
//! - Dragonfly/Redis for distributed, production use
//! - In-memory for development and single-instance deployments
//!
//! Both run the whole refill/debit/persist step atomically per key.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::types::{BucketPolicy, TokenBucketState};

/// Atomic token bucket step.
///
/// KEYS[1] bucket key. ARGV: capacity, refill rate (tokens/ms), now (ms), cost.
/// Returns `{admitted, remaining}`; `remaining` travels as a string because
/// Redis truncates Lua numbers to integers in replies.
pub const TOKEN_BUCKET_SCRIPT: &str = r#"
local capacity = tonumber(ARGV[1])
local rate = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local cost = tonumber(ARGV[4])

local state = redis.call('HMGET', KEYS[1], 'tokens', 'last')
local tokens = tonumber(state[1])
local last = tonumber(state[2])
if tokens == nil or last == nil then
  tokens = capacity
  last = now
end

if now > last then
  tokens = math.min(capacity, tokens + (now - last) * rate)
  last = now
end

local admitted = 0
if tokens >= cost then
  tokens = tokens - cost
  admitted = 1
end

redis.call('HSET', KEYS[1], 'tokens', tostring(tokens), 'last', tostring(last))
redis.call('PEXPIRE', KEYS[1], math.ceil(capacity / rate))

return {admitted, tostring(tokens)}
"#;

/// Errors raised by a rate limit storage backend
#[derive(Error, Debug)]
pub enum RateLimitStorageError {
    #[error("Failed to connect to rate limit store: {0}")]
    Connection(String),

    #[error("Rate limit store command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("Unexpected reply from rate limit store: {0}")]
    Reply(String),
}

/// Outcome of one atomic bucket step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketOutcome {
    pub admitted: bool,
    pub remaining: f64,
}

/// Trait for rate limit storage backends
#[async_trait]
pub trait RateLimitStorage: Send + Sync {
    /// Refill, debit `cost` if available and persist, as one atomic step
    async fn take_tokens(
        &self,
        key: &str,
        policy: &BucketPolicy,
        now_ms: u64,
        cost: u32,
    ) -> Result<BucketOutcome, RateLimitStorageError>;

    /// Delete a bucket
    async fn delete(&self, key: &str) -> Result<(), RateLimitStorageError>;

    /// Cleanup expired entries (for in-memory storage)
    async fn cleanup(&self);

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Dragonfly/Redis storage backend
pub struct DragonflyRateLimitStorage {
    connection_manager: ConnectionManager,
    script: redis::Script,
}

impl DragonflyRateLimitStorage {
    /// Create a new Dragonfly storage backend, giving up after `connect_timeout`
    pub async fn new(url: &str, connect_timeout: Duration) -> Result<Self, RateLimitStorageError> {
        let client = redis::Client::open(url).map_err(|e| {
            warn!("Failed to create Redis client for rate limiting: {}", e);
            RateLimitStorageError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let connect = async {
            let mut manager = ConnectionManager::new(client).await?;
            redis::cmd("PING").query_async::<String>(&mut manager).await?;
            Ok::<_, redis::RedisError>(manager)
        };

        let connection_manager = tokio::time::timeout(connect_timeout, connect)
            .await
            .map_err(|_| {
                RateLimitStorageError::Connection(format!(
                    "no answer within {}ms",
                    connect_timeout.as_millis()
                ))
            })?
            .map_err(|e| {
                warn!("Failed to connect to Redis for rate limiting: {}", e);
                RateLimitStorageError::Connection(e.to_string())
            })?;

        debug!("Successfully connected to Dragonfly for rate limiting");

        Ok(Self {
            connection_manager,
            script: redis::Script::new(TOKEN_BUCKET_SCRIPT),
        })
    }
}

#[async_trait]
impl RateLimitStorage for DragonflyRateLimitStorage {
    async fn take_tokens(
        &self,
        key: &str,
        policy: &BucketPolicy,
        now_ms: u64,
        cost: u32,
    ) -> Result<BucketOutcome, RateLimitStorageError> {
        let mut conn = self.connection_manager.clone();

        // EVALSHA, falling back to EVAL when the script is not cached yet
        let (admitted, remaining): (i64, String) = self
            .script
            .key(key)
            .arg(policy.capacity)
            .arg(policy.refill_rate)
            .arg(now_ms)
            .arg(cost)
            .invoke_async(&mut conn)
            .await?;

        let remaining = remaining
            .parse::<f64>()
            .map_err(|e| RateLimitStorageError::Reply(format!("remaining {:?}: {}", remaining, e)))?;

        Ok(BucketOutcome {
            admitted: admitted == 1,
            remaining,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), RateLimitStorageError> {
        let mut conn = self.connection_manager.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<i64>(&mut conn)
            .await?;
        Ok(())
    }

    async fn cleanup(&self) {
        // Redis expires idle buckets through PEXPIRE
    }

    fn backend_name(&self) -> &'static str {
        "dragonfly"
    }
}

/// In-memory storage entry with expiration
struct MemoryEntry {
    state: TokenBucketState,
    expires_at: u64,
}

/// In-memory storage backend for development/single instance.
///
/// The refill clock is the caller-supplied `now_ms`, as with the script.
pub struct InMemoryRateLimitStorage {
    buckets: Mutex<HashMap<String, MemoryEntry>>,
}

impl InMemoryRateLimitStorage {
    /// Create a new in-memory storage backend
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored buckets, expired ones included until cleanup
    pub async fn len(&self) -> usize {
        self.buckets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.buckets.lock().await.is_empty()
    }

    /// Drop buckets idle past their TTL as of `now_ms`
    pub async fn cleanup_at(&self, now_ms: u64) -> usize {
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, entry| entry.expires_at > now_ms);
        before - buckets.len()
    }
}

impl Default for InMemoryRateLimitStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStorage for InMemoryRateLimitStorage {
    async fn take_tokens(
        &self,
        key: &str,
        policy: &BucketPolicy,
        now_ms: u64,
        cost: u32,
    ) -> Result<BucketOutcome, RateLimitStorageError> {
        // Held across read, update and write
        let mut buckets = self.buckets.lock().await;

        let mut state = match buckets.get(key) {
            Some(entry) if entry.expires_at > now_ms => entry.state.clone(),
            _ => TokenBucketState::full(policy, now_ms),
        };
        let admitted = state.take(policy, now_ms, cost);
        let remaining = state.tokens;

        buckets.insert(
            key.to_string(),
            MemoryEntry {
                state,
                expires_at: now_ms.saturating_add(policy.idle_ttl_ms()),
            },
        );

        Ok(BucketOutcome {
            admitted,
            remaining,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), RateLimitStorageError> {
        self.buckets.lock().await.remove(key);
        Ok(())
    }

    async fn cleanup(&self) {
        let removed = self.cleanup_at(super::types::current_time_millis()).await;
        debug!(removed, "Completed rate limit storage cleanup");
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
