//! Token blacklist service for credential revocation
//!
//! Revoked tokens are stored in the shared cache with a TTL matching the
//! token's remaining lifetime, so entries vanish once the token would have
//! expired anyway and every instance sees every revocation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::ApplicationError;
use crate::application::services::CacheService;

/// Token blacklist service trait
#[async_trait]
pub trait TokenBlacklistService: Send + Sync {
    /// Add a token to the blacklist. Blacklisting twice is not an error.
    ///
    /// # Arguments
    /// * `token_id` - Identifier from [`hash_token`]
    /// * `ttl` - Should match the token's remaining lifetime
    async fn blacklist_token(&self, token_id: &str, ttl: Duration)
    -> Result<(), ApplicationError>;

    /// Check if a token is blacklisted
    async fn is_blacklisted(&self, token_id: &str) -> Result<bool, ApplicationError>;

    /// Atomically blacklist a token that is not yet blacklisted.
    ///
    /// Returns `true` for exactly one caller per token, which makes the
    /// token single-use.
    async fn claim_token(&self, token_id: &str, ttl: Duration) -> Result<bool, ApplicationError>;
}

/// Derive the blacklist identifier from the raw token string (SHA-256, hex)
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache-backed implementation of token blacklist
pub struct CacheTokenBlacklistService<C: CacheService> {
    cache: Arc<C>,
}

impl<C: CacheService> CacheTokenBlacklistService<C> {
    pub fn new(cache: Arc<C>) -> Self {
        Self { cache }
    }

    /// Generate the cache key for a blacklisted token
    fn token_key(token_id: &str) -> String {
        format!("auth:blacklist:token:{}", token_id)
    }
}

#[async_trait]
impl<C: CacheService> TokenBlacklistService for CacheTokenBlacklistService<C> {
    async fn blacklist_token(
        &self,
        token_id: &str,
        ttl: Duration,
    ) -> Result<(), ApplicationError> {
        let key = Self::token_key(token_id);
        let timestamp = chrono::Utc::now().timestamp();

        self.cache.set(&key, &timestamp, ttl).await?;

        tracing::debug!(token_id = %token_id, ttl_secs = ttl.as_secs(), "Token added to blacklist");
        Ok(())
    }

    async fn is_blacklisted(&self, token_id: &str) -> Result<bool, ApplicationError> {
        self.cache.exists(&Self::token_key(token_id)).await
    }

    async fn claim_token(&self, token_id: &str, ttl: Duration) -> Result<bool, ApplicationError> {
        let key = Self::token_key(token_id);
        let timestamp = chrono::Utc::now().timestamp();

        let claimed = self.cache.set_if_absent(&key, &timestamp, ttl).await?;
        tracing::debug!(token_id = %token_id, claimed, "Token claim attempted");
        Ok(claimed)
    }
}
