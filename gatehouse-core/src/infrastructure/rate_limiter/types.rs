//! Rate limiter types and core data structures

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::BucketConfig;

/// Named category of operation with its own bucket budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    Register,
    Login,
    Refresh,
    Logout,
    Profile,
    /// Process-wide budget shared by every route
    Global,
}

impl ActionClass {
    /// Get the class name used in keys, logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionClass::Register => "register",
            ActionClass::Login => "login",
            ActionClass::Refresh => "refresh",
            ActionClass::Logout => "logout",
            ActionClass::Profile => "profile",
            ActionClass::Global => "global",
        }
    }
}

impl std::fmt::Display for ActionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key used to identify rate limit buckets: one per (action class, caller)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub action: ActionClass,
    pub caller: String,
}

impl RateLimitKey {
    /// Caller used for the process-wide bucket
    pub const GLOBAL_CALLER: &'static str = "all";

    pub fn new(action: ActionClass, caller: impl Into<String>) -> Self {
        Self {
            action,
            caller: caller.into(),
        }
    }

    pub fn global() -> Self {
        Self::new(ActionClass::Global, Self::GLOBAL_CALLER)
    }

    /// Convert to a Redis-compatible key string, `prefix:action:caller`
    pub fn to_redis_key(&self, prefix: &str) -> String {
        if prefix.is_empty() {
            format!("{}:{}", self.action, self.caller)
        } else {
            format!("{}:{}:{}", prefix, self.action, self.caller)
        }
    }
}

/// Bucket parameters supplied at check time; never stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketPolicy {
    /// Burst size
    pub capacity: u32,
    /// Tokens added per millisecond
    pub refill_rate: f64,
}

impl BucketPolicy {
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
        }
    }

    pub fn per_minute(capacity: u32, refill_per_minute: f64) -> Self {
        Self::new(capacity, refill_per_minute / 60_000.0)
    }

    /// Time for an empty bucket to refill completely. Idle buckets expire after it.
    pub fn idle_ttl_ms(&self) -> u64 {
        ((self.capacity as f64 / self.refill_rate).ceil() as u64).max(1)
    }

    /// Seconds until `cost` tokens are available again, never below 1
    pub fn retry_after_secs(&self, remaining: f64, cost: u32) -> u64 {
        let missing = (cost as f64 - remaining).max(0.0);
        let wait_ms = (missing / self.refill_rate).ceil() as u64;
        wait_ms.div_ceil(1000).max(1)
    }
}

impl From<&BucketConfig> for BucketPolicy {
    fn from(config: &BucketConfig) -> Self {
        Self::new(config.capacity, config.refill_rate_per_ms())
    }
}

/// Token bucket state for a single key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBucketState {
    /// Current number of tokens in the bucket
    pub tokens: f64,
    /// Last accounted refill (Unix timestamp in milliseconds)
    pub last_refill: u64,
}

impl TokenBucketState {
    /// A bucket seen for the first time starts full
    pub fn full(policy: &BucketPolicy, now_ms: u64) -> Self {
        Self {
            tokens: policy.capacity as f64,
            last_refill: now_ms,
        }
    }

    /// Refill for the elapsed time, then debit `cost` if available.
    ///
    /// A clock reading older than `last_refill` refills nothing and leaves
    /// the refill clock where it is.
    pub fn take(&mut self, policy: &BucketPolicy, now_ms: u64, cost: u32) -> bool {
        if now_ms > self.last_refill {
            let elapsed = (now_ms - self.last_refill) as f64;
            self.tokens = (self.tokens + elapsed * policy.refill_rate).min(policy.capacity as f64);
            self.last_refill = now_ms;
        }

        let cost = cost as f64;
        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Bucket capacity
    pub limit: u32,
    /// Tokens left after this check
    pub remaining: f64,
    /// Retry-After duration in seconds (only set when blocked)
    pub retry_after: Option<u64>,
    /// The action class that was checked
    pub action: ActionClass,
    /// Admitted without consulting the store
    pub degraded: bool,
}

impl RateLimitResult {
    /// Create a new allowed result
    pub fn allowed(action: ActionClass, limit: u32, remaining: f64) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            retry_after: None,
            action,
            degraded: false,
        }
    }

    /// Create a new blocked result
    pub fn blocked(action: ActionClass, limit: u32, remaining: f64, retry_after: u64) -> Self {
        Self {
            allowed: false,
            limit,
            remaining,
            retry_after: Some(retry_after),
            action,
            degraded: false,
        }
    }

    /// Admission granted because the store could not be consulted
    pub fn fail_open(action: ActionClass, limit: u32) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: limit as f64,
            retry_after: None,
            action,
            degraded: true,
        }
    }

    /// Admission when limiting is disabled or the class has no budget
    pub fn unlimited(action: ActionClass) -> Self {
        Self::allowed(action, u32::MAX, u32::MAX as f64)
    }

    /// Whole tokens remaining, as reported in headers
    pub fn remaining_whole(&self) -> u32 {
        self.remaining.max(0.0).floor() as u32
    }
}

/// Get current time in milliseconds since Unix epoch
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
