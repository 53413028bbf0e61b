//! Rate Limiter Service
//!
//! Maps action classes to their configured budgets and runs the token
//! bucket against the selected storage backend.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::storage::{DragonflyRateLimitStorage, InMemoryRateLimitStorage, RateLimitStorage};
use super::token_bucket::TokenBucket;
use super::types::{ActionClass, BucketPolicy, RateLimitKey, RateLimitResult};
use crate::config::{RateLimitConfig, RateLimitStorageBackend};

/// Main rate limiter service
pub struct RateLimiterService {
    token_bucket: TokenBucket,
    storage: Arc<dyn RateLimitStorage>,
    config: RateLimitConfig,
}

impl RateLimiterService {
    /// Create a new rate limiter service with explicit Dragonfly URL.
    ///
    /// An unreachable Dragonfly falls back to in-memory storage.
    pub async fn new_with_url(
        config: RateLimitConfig,
        dragonfly_url: &str,
        connect_timeout: Duration,
    ) -> Self {
        let storage: Arc<dyn RateLimitStorage> = match config.storage_backend {
            RateLimitStorageBackend::Dragonfly => {
                match DragonflyRateLimitStorage::new(dragonfly_url, connect_timeout).await {
                    Ok(storage) => {
                        info!(
                            "Rate limiter using Dragonfly storage backend at {}",
                            dragonfly_url
                        );
                        Arc::new(storage)
                    }
                    Err(e) => {
                        warn!(
                            "Failed to connect to Dragonfly for rate limiting, falling back to in-memory: {}",
                            e
                        );
                        Arc::new(InMemoryRateLimitStorage::new())
                    }
                }
            }
            RateLimitStorageBackend::Memory => {
                info!("Rate limiter using in-memory storage backend");
                Arc::new(InMemoryRateLimitStorage::new())
            }
        };

        Self::with_storage(storage, config)
    }

    /// Create with a custom storage backend
    pub fn with_storage(storage: Arc<dyn RateLimitStorage>, config: RateLimitConfig) -> Self {
        let token_bucket = TokenBucket::new(
            Arc::clone(&storage),
            &config.key_prefix,
            Duration::from_millis(config.store_timeout_ms),
        );

        Self {
            token_bucket,
            storage,
            config,
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Budget for an action class; `None` when the class is unlimited
    pub fn policy_for(&self, action: ActionClass) -> Option<BucketPolicy> {
        let classes = &self.config.classes;
        let bucket = match action {
            ActionClass::Register => &classes.register,
            ActionClass::Login => &classes.login,
            ActionClass::Refresh => &classes.refresh,
            ActionClass::Logout => &classes.logout,
            ActionClass::Profile => &classes.profile,
            ActionClass::Global => classes.global.as_ref()?,
        };
        Some(BucketPolicy::from(bucket))
    }

    /// Check and consume one token for `caller` in `action`'s bucket
    pub async fn check(&self, action: ActionClass, caller: &str) -> RateLimitResult {
        self.check_key(&RateLimitKey::new(action, caller), 1).await
    }

    /// Check the process-wide bucket shared by every caller
    pub async fn check_global(&self) -> RateLimitResult {
        self.check_key(&RateLimitKey::global(), 1).await
    }

    /// Check an explicit key with an explicit cost
    pub async fn check_key(&self, key: &RateLimitKey, cost: u32) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::unlimited(key.action);
        }
        match self.policy_for(key.action) {
            Some(policy) => self.token_bucket.check(key, &policy, cost).await,
            None => RateLimitResult::unlimited(key.action),
        }
    }

    /// Start the cleanup task for in-memory storage; stops when `shutdown` fires
    pub fn start_cleanup_task(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let cleanup_interval = Duration::from_secs(self.config.cleanup_interval_seconds.max(1));

        tokio::spawn(async move {
            let mut interval = interval(cleanup_interval);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("Rate limiter cleanup task stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        self.storage.cleanup().await;
                    }
                }
            }
        })
    }

    /// Name of the storage backend in use
    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }

    /// Get the configuration
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
