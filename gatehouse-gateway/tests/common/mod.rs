//! Test harness: the full router over in-memory stores

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{Request, Response, header},
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::ServiceExt;

use gatehouse_core::Config;
use gatehouse_core::application::auth::{
    TokenService,
    use_cases::{GetProfileUseCase, LoginUseCase, RegisterUserUseCase},
};
use gatehouse_core::config::{BucketConfig, RateLimitStorageBackend, RefreshPolicy};
use gatehouse_core::domain::auth::{
    entities::User, errors::AuthError, repositories::IUserRepository, value_objects::Email,
};
use gatehouse_core::infrastructure::auth::{CacheTokenBlacklistService, JwtService, PasswordHasher};
use gatehouse_core::infrastructure::cache::{CacheBackend, MemoryCache};
use gatehouse_core::infrastructure::rate_limiter::{
    InMemoryRateLimitStorage, RateLimitStorage, RateLimiterService,
};
use gatehouse_gateway::presentation::{
    GatewayState, HealthState, ProfileState, auth::AuthAppState, create_router,
};

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters-long";
pub const PASSWORD: &str = "correct-horse-battery";

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl IUserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError> {
        Ok(self.users.lock().await.get(email.as_str()).cloned())
    }

    async fn create(&self, user: &User) -> Result<(), AuthError> {
        let mut users = self.users.lock().await;
        if users.contains_key(user.email.as_str()) {
            return Err(AuthError::EmailAlreadyExists {
                email: user.email.as_str().to_string(),
            });
        }
        users.insert(user.email.as_str().to_string(), user.clone());
        Ok(())
    }
}

/// Config with generous budgets, in-memory backends and docs enabled
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.rate_limit.storage_backend = RateLimitStorageBackend::Memory;
    let generous = BucketConfig::new(100, 100.0);
    config.rate_limit.classes.register = generous.clone();
    config.rate_limit.classes.login = generous.clone();
    config.rate_limit.classes.refresh = generous.clone();
    config.rate_limit.classes.logout = generous.clone();
    config.rate_limit.classes.profile = generous;
    config
}

pub fn build_router(config: &Config) -> Router {
    let storage: Arc<dyn RateLimitStorage> = Arc::new(InMemoryRateLimitStorage::new());
    build_router_with_storage(config, storage)
}

pub fn build_router_with_storage(config: &Config, storage: Arc<dyn RateLimitStorage>) -> Router {
    let users: Arc<dyn IUserRepository> = Arc::new(InMemoryUserRepository::default());
    let hasher = Arc::new(PasswordHasher::with_params(4096, 1, 1).unwrap());
    let cache = Arc::new(CacheBackend::Memory(MemoryCache::new()));

    let jwt = Arc::new(JwtService::from_config(&config.auth));
    let blacklist = Arc::new(CacheTokenBlacklistService::new(Arc::clone(&cache)));
    let token_service = Arc::new(TokenService::from_config(&config.auth, jwt, blacklist));

    let rate_limiter = Arc::new(RateLimiterService::with_storage(
        storage,
        config.rate_limit.clone(),
    ));

    let state = GatewayState {
        auth: AuthAppState {
            register_use_case: Arc::new(RegisterUserUseCase::new(
                Arc::clone(&users),
                Arc::clone(&hasher),
                config.auth.min_password_length,
            )),
            login_use_case: Arc::new(LoginUseCase::new(
                Arc::clone(&users),
                hasher,
                Arc::clone(&token_service),
            )),
            token_service,
        },
        profile: ProfileState {
            get_profile_use_case: Arc::new(GetProfileUseCase::new(
                users,
                Arc::clone(&cache),
                Duration::from_secs(config.cache.profile_ttl_seconds),
            )),
        },
        health: HealthState {
            rate_limiter_backend: rate_limiter.backend_name(),
            cache_backend: cache.backend_name(),
        },
        rate_limiter,
    };

    create_router(state, config)
}

pub fn rotating_config() -> Config {
    let mut config = test_config();
    config.auth.refresh_policy = RefreshPolicy::Rotate;
    config
}

pub fn peer(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([192, 0, 2, last_octet], 50000))
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Send a request as if it came from `from`
pub async fn send(router: &Router, mut request: Request<Body>, from: SocketAddr) -> Response<Body> {
    request.extensions_mut().insert(ConnectInfo(from));
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn register(router: &Router, email: &str) -> Response<Body> {
    let request = json_request(
        "POST",
        "/api/v1/auth/register",
        serde_json::json!({ "name": "Test User", "email": email, "password": PASSWORD }),
    );
    send(router, request, peer(1)).await
}

/// Register then log in, returning (access, refresh)
pub async fn login(router: &Router, email: &str) -> (String, String) {
    register(router, email).await;
    let request = json_request(
        "POST",
        "/api/v1/auth/login",
        serde_json::json!({ "email": email, "password": PASSWORD }),
    );
    let body = body_json(send(router, request, peer(1)).await).await;
    (
        body["access_token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}
