//! Common test utilities for gatehouse-core

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use gatehouse_core::config::{BucketConfig, RateLimitConfig, RateLimitStorageBackend};
use gatehouse_core::infrastructure::rate_limiter::{
    InMemoryRateLimitStorage, RateLimitStorage, TokenBucket,
};

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters-long";

/// In-memory limiter config with every class at `capacity` per minute
pub fn memory_config(capacity: u32) -> RateLimitConfig {
    let bucket = BucketConfig::new(capacity, capacity as f64);
    let mut config = RateLimitConfig {
        storage_backend: RateLimitStorageBackend::Memory,
        ..RateLimitConfig::default()
    };
    config.classes.register = bucket.clone();
    config.classes.login = bucket.clone();
    config.classes.refresh = bucket.clone();
    config.classes.logout = bucket.clone();
    config.classes.profile = bucket;
    config
}

pub fn memory_bucket() -> (Arc<InMemoryRateLimitStorage>, TokenBucket) {
    let storage = Arc::new(InMemoryRateLimitStorage::new());
    let bucket = TokenBucket::new(
        Arc::clone(&storage) as Arc<dyn RateLimitStorage>,
        "rate",
        Duration::from_secs(2),
    );
    (storage, bucket)
}

/// Redis URL for `#[ignore]`d tests that need a live store
pub fn test_redis_url() -> String {
    std::env::var("GATEHOUSE_TEST_REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}
