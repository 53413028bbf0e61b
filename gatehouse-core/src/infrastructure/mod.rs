//! Infrastructure Layer - External concerns and implementations
//!
//! Backing store clients, the user store, credential signing and password hashing.

pub mod auth;
pub mod cache;
pub mod rate_limiter;

pub use cache::{CacheBackend, DragonflyCache, MemoryCache};
pub use rate_limiter::RateLimiterService;
