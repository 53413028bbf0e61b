//! Application setup and wiring

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use gatehouse_core::Config;
use gatehouse_core::application::auth::{
    TokenService,
    use_cases::{GetProfileUseCase, LoginUseCase, RegisterUserUseCase},
};
use gatehouse_core::config::CacheStoreBackend;
use gatehouse_core::domain::auth::repositories::IUserRepository;
use gatehouse_core::infrastructure::{
    CacheBackend, DragonflyCache, MemoryCache, RateLimiterService,
    auth::{CacheTokenBlacklistService, JwtService, PasswordHasher, SqlxUserRepository},
};
use gatehouse_gateway::presentation::{
    GatewayState, HealthState, ProfileState, auth::AuthAppState, create_router,
};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
    pub background_tasks: Vec<JoinHandle<()>>,
}

/// Cancel background tasks and wait for them to finish.
///
/// Returns `false` if any task was still running when `grace` elapsed; those
/// tasks are aborted.
pub async fn drain_background_tasks(
    shutdown_token: &CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    grace: Duration,
) -> bool {
    shutdown_token.cancel();

    let deadline = tokio::time::Instant::now() + grace;
    let mut clean = true;
    for mut task in tasks {
        match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Background task ended abnormally: {}", e);
            }
            Err(_) => {
                task.abort();
                clean = false;
            }
        }
    }

    if !clean {
        tracing::warn!(
            grace_ms = grace.as_millis(),
            "Background tasks did not stop in time and were aborted"
        );
    }
    clean
}

/// Connect the cache that also holds the revocation set.
///
/// An unreachable Dragonfly falls back to in-memory storage, in which case
/// revocations are only seen by this instance.
async fn connect_cache(config: &Config) -> CacheBackend {
    if config.cache.backend == CacheStoreBackend::Memory {
        tracing::info!("Cache using in-memory backend");
        return CacheBackend::Memory(MemoryCache::new());
    }

    tracing::info!(
        "Initializing Dragonfly DB cache at {}",
        config.cache.dragonfly_url
    );
    match DragonflyCache::new(
        &config.cache.dragonfly_url,
        Duration::from_secs(config.cache.dragonfly_connection_timeout_seconds),
        Duration::from_millis(config.cache.operation_timeout_ms),
    )
    .await
    {
        Ok(cache) => CacheBackend::Dragonfly(cache),
        Err(e) => {
            tracing::warn!(
                "Failed to connect to Dragonfly for caching, falling back to in-memory: {}",
                e
            );
            CacheBackend::Memory(MemoryCache::new())
        }
    }
}

/// Build the gateway state from already-connected stores
pub fn build_gateway_state(
    config: &Config,
    user_repository: Arc<dyn IUserRepository>,
    password_hasher: Arc<PasswordHasher>,
    cache: Arc<CacheBackend>,
    rate_limiter: Arc<RateLimiterService>,
) -> GatewayState {
    let jwt_service = Arc::new(JwtService::from_config(&config.auth));
    let token_blacklist = Arc::new(CacheTokenBlacklistService::new(Arc::clone(&cache)));
    let token_service = Arc::new(TokenService::from_config(
        &config.auth,
        jwt_service,
        token_blacklist,
    ));

    let register_use_case = Arc::new(RegisterUserUseCase::new(
        Arc::clone(&user_repository),
        Arc::clone(&password_hasher),
        config.auth.min_password_length,
    ));
    let login_use_case = Arc::new(LoginUseCase::new(
        Arc::clone(&user_repository),
        password_hasher,
        Arc::clone(&token_service),
    ));
    let get_profile_use_case = Arc::new(GetProfileUseCase::new(
        user_repository,
        Arc::clone(&cache),
        Duration::from_secs(config.cache.profile_ttl_seconds),
    ));

    GatewayState {
        auth: AuthAppState {
            register_use_case,
            login_use_case,
            token_service,
        },
        profile: ProfileState {
            get_profile_use_case,
        },
        health: HealthState {
            rate_limiter_backend: rate_limiter.backend_name(),
            cache_backend: cache.backend_name(),
        },
        rate_limiter,
    }
}

/// Create the application router and return an AppHandle for shutdown coordination
pub async fn create_app(
    config: Config,
) -> Result<AppHandle, Box<dyn std::error::Error + Send + Sync>> {
    let startup_time = Instant::now();
    let shutdown_token = CancellationToken::new();

    // Initialize database pool
    let db_pool = Arc::new(
        PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_idle.unwrap_or(0))
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout_seconds))
            .max_lifetime(config.database.max_lifetime_seconds.map(Duration::from_secs))
            .idle_timeout(config.database.idle_timeout_seconds.map(Duration::from_secs))
            .connect(&config.database.url)
            .await?,
    );

    let user_repository = SqlxUserRepository::new(db_pool);
    user_repository.ensure_schema().await?;
    let user_repository: Arc<dyn IUserRepository> = Arc::new(user_repository);

    let cache = Arc::new(connect_cache(&config).await);

    let rate_limiter = Arc::new(
        RateLimiterService::new_with_url(
            config.rate_limit.clone(),
            &config.cache.dragonfly_url,
            Duration::from_secs(config.cache.dragonfly_connection_timeout_seconds),
        )
        .await,
    );
    let cleanup_task = Arc::clone(&rate_limiter).start_cleanup_task(shutdown_token.clone());

    let state = build_gateway_state(
        &config,
        user_repository,
        Arc::new(PasswordHasher::new()),
        cache,
        rate_limiter,
    );
    let router = create_router(state, &config);

    tracing::info!(
        startup_ms = startup_time.elapsed().as_millis(),
        "Application initialized"
    );

    Ok(AppHandle {
        router,
        shutdown_token,
        background_tasks: vec![cleanup_task],
    })
}
