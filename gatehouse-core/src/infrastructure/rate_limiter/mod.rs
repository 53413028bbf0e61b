//! Rate Limiting Infrastructure
//!
//! Token bucket limiting per (action class, caller) pair, with bucket state
//! in Dragonfly/Redis so every instance shares one budget. Each check is a
//! single atomic script run; an unavailable store admits the request.

pub mod service;
pub mod storage;
pub mod token_bucket;
pub mod types;

pub use service::RateLimiterService;
pub use storage::{
    BucketOutcome, DragonflyRateLimitStorage, InMemoryRateLimitStorage, RateLimitStorage,
    RateLimitStorageError,
};
pub use token_bucket::TokenBucket;
pub use types::{ActionClass, BucketPolicy, RateLimitKey, RateLimitResult, TokenBucketState};
