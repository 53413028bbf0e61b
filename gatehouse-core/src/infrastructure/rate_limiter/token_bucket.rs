//! Token Bucket Rate Limiter
//!
//! Tokens are added to the bucket at a constant rate, and each request
//! consumes tokens. If the bucket is empty, the request is rejected.
//! This allows for bursty traffic while maintaining an average rate limit.
//!
//! The limiter fails open: when the store errors or does not answer within
//! the store timeout, the request is admitted and a warning is logged.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::storage::RateLimitStorage;
use super::types::{BucketPolicy, RateLimitKey, RateLimitResult, current_time_millis};

/// Token bucket rate limiter
pub struct TokenBucket {
    storage: Arc<dyn RateLimitStorage>,
    key_prefix: String,
    store_timeout: Duration,
}

impl TokenBucket {
    /// Create a new token bucket rate limiter
    pub fn new(storage: Arc<dyn RateLimitStorage>, key_prefix: &str, store_timeout: Duration) -> Self {
        Self {
            storage,
            key_prefix: key_prefix.to_string(),
            store_timeout,
        }
    }

    /// Check if a request is allowed and consume tokens
    pub async fn check(&self, key: &RateLimitKey, policy: &BucketPolicy, cost: u32) -> RateLimitResult {
        self.check_at(key, policy, cost, current_time_millis()).await
    }

    /// Same as [`check`](Self::check) with an explicit clock reading in milliseconds
    pub async fn check_at(
        &self,
        key: &RateLimitKey,
        policy: &BucketPolicy,
        cost: u32,
        now_ms: u64,
    ) -> RateLimitResult {
        let redis_key = key.to_redis_key(&self.key_prefix);

        let step = self.storage.take_tokens(&redis_key, policy, now_ms, cost);
        let outcome = match tokio::time::timeout(self.store_timeout, step).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(
                    key = %redis_key,
                    backend = self.storage.backend_name(),
                    "Rate limit store error, allowing request: {}",
                    e
                );
                return RateLimitResult::fail_open(key.action, policy.capacity);
            }
            Err(_) => {
                warn!(
                    key = %redis_key,
                    backend = self.storage.backend_name(),
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "Rate limit store timed out, allowing request"
                );
                return RateLimitResult::fail_open(key.action, policy.capacity);
            }
        };

        if outcome.admitted {
            debug!(
                key = %redis_key,
                remaining = outcome.remaining,
                limit = policy.capacity,
                "Rate limit check passed"
            );
            RateLimitResult::allowed(key.action, policy.capacity, outcome.remaining)
        } else {
            let retry_after = policy.retry_after_secs(outcome.remaining, cost);
            warn!(
                key = %redis_key,
                retry_after,
                "Rate limit exceeded"
            );
            RateLimitResult::blocked(key.action, policy.capacity, outcome.remaining, retry_after)
        }
    }
}
