//! Route definitions and server setup

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::{
    Router, middleware,
    response::Json,
    routing::{MethodRouter, get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use gatehouse_core::Config;
use gatehouse_core::infrastructure::rate_limiter::{ActionClass, RateLimiterService};

use crate::presentation::{
    auth::controller::{AuthAppState, login, logout, refresh_token, register},
    controllers::{HealthState, ProfileState, get_profile, health_check},
    middleware::{
        RateLimiterState, RequireAuthState, logging_middleware, rate_limit_middleware,
        require_auth_middleware,
    },
    models::*,
};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::health::health_check,
        crate::presentation::controllers::profile::get_profile,
        crate::presentation::auth::controller::register,
        crate::presentation::auth::controller::login,
        crate::presentation::auth::controller::refresh_token,
        crate::presentation::auth::controller::logout
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            ProfileResponse,
            crate::presentation::auth::models::RegisterRequest,
            crate::presentation::auth::models::LoginRequest,
            crate::presentation::auth::models::RefreshRequest,
            crate::presentation::auth::models::LogoutRequest,
            crate::presentation::auth::models::MessageResponse,
            crate::presentation::auth::models::LoginResponse,
            crate::presentation::auth::models::RefreshResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness endpoint"),
        (name = "auth", description = "Registration, login, token refresh and logout"),
        (name = "profile", description = "Endpoints for authenticated callers")
    ),
    info(
        title = "Gatehouse API",
        version = "0.3.0",
        description = "Rate-limited, token-authenticated service boundary"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Everything the router needs, built once at startup
#[derive(Clone)]
pub struct GatewayState {
    pub auth: AuthAppState,
    pub profile: ProfileState,
    pub health: HealthState,
    pub rate_limiter: Arc<RateLimiterService>,
}

/// Put the token bucket for `action` in front of a route
fn rate_limited<S>(
    route: MethodRouter<S>,
    rate_limiter: &Arc<RateLimiterService>,
    action: ActionClass,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.layer(middleware::from_fn_with_state(
        Arc::new(RateLimiterState::new(Arc::clone(rate_limiter), action)),
        rate_limit_middleware,
    ))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers([
            header::RETRY_AFTER,
            header::HeaderName::from_static("ratelimit-limit"),
            header::HeaderName::from_static("ratelimit-remaining"),
        ])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.len() == 1 && allowed_origins[0] == "*" {
        tracing::warn!("CORS: Using wildcard origin (*)");
        return cors.allow_origin(tower_http::cors::AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| {
                    tracing::warn!(origin, "Invalid CORS origin in config; skipping");
                })
                .ok()
        })
        .collect();

    cors.allow_origin(origins)
}

/// Create the application router with its middleware stack.
///
/// Each API route runs its own action class bucket; `/profile` additionally
/// requires a verified access token, checked after the limiter.
pub fn create_router(state: GatewayState, config: &Config) -> Router {
    let limiter = &state.rate_limiter;
    let require_auth = middleware::from_fn_with_state(
        Arc::new(RequireAuthState {
            token_service: Arc::clone(&state.auth.token_service),
        }),
        require_auth_middleware,
    );

    let auth_routes = Router::new()
        .route(
            "/auth/register",
            rate_limited(post(register), limiter, ActionClass::Register),
        )
        .route(
            "/auth/login",
            rate_limited(post(login), limiter, ActionClass::Login),
        )
        .route(
            "/auth/refresh",
            rate_limited(post(refresh_token), limiter, ActionClass::Refresh),
        )
        .route(
            "/auth/logout",
            rate_limited(post(logout), limiter, ActionClass::Logout),
        )
        .with_state(state.auth.clone());

    let profile_routes = Router::new()
        .route(
            "/profile",
            rate_limited(
                get(get_profile).layer(require_auth),
                limiter,
                ActionClass::Profile,
            ),
        )
        .with_state(state.profile.clone());

    let api_routes = Router::new().merge(auth_routes).merge(profile_routes);

    let mut public_routes = Router::new()
        .route("/health", get(health_check))
        .with_state(state.health.clone());

    if config.server.enable_docs {
        public_routes = public_routes.route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server.allowed_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_seconds),
        ))
        .layer(middleware::from_fn(logging_middleware));

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(public_routes)
        .layer(service_builder)
}
