//! HTTP middleware for the request gate
//!
//! Protected routes run the rate limiter first, then credential
//! verification, then the handler with the caller's identity attached.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::{net::SocketAddr, sync::Arc, time::Instant};
use uuid::Uuid;

use gatehouse_core::application::auth::TokenService;
use gatehouse_core::application::errors::ApplicationError;
use gatehouse_core::domain::auth::{errors::AuthError, value_objects::TokenKind};
use gatehouse_core::infrastructure::rate_limiter::{
    ActionClass, RateLimitResult, RateLimiterService,
};

use crate::presentation::auth::extractors::AuthUser;
use crate::presentation::models::ErrorResponse;

/// Caller identity used when the peer address is unknown
pub const UNKNOWN_CALLER: &str = "unknown";

/// Convert ApplicationError to HTTP response
pub fn application_error_to_response(error: ApplicationError) -> Response {
    let (status, code, message) = match &error {
        ApplicationError::Authentication(auth_error) => match auth_error {
            e if e.is_unauthorized() => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", e.to_string()),
            AuthError::EmailAlreadyExists { .. } => (
                StatusCode::CONFLICT,
                "EMAIL_ALREADY_EXISTS",
                "Email already registered".to_string(),
            ),
            AuthError::InvalidEmail { .. }
            | AuthError::InvalidName { .. }
            | AuthError::WeakPassword { .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", auth_error.to_string())
            }
            AuthError::UserNotFound { .. } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "User not found".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        },
        ApplicationError::RateLimited { retry_after, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMIT_EXCEEDED",
            format!(
                "Rate limit exceeded. Please retry after {} seconds.",
                retry_after
            ),
        ),
        ApplicationError::Validation { message } => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            message.clone(),
        ),
        ApplicationError::NotFound { resource } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{} not found", resource),
        ),
        ApplicationError::Cache(_)
        | ApplicationError::Json(_)
        | ApplicationError::Configuration { .. }
        | ApplicationError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred".to_string(),
        ),
    };

    // Only caller input errors carry detail; server-side error text stays in the log.
    let details = (status == StatusCode::BAD_REQUEST)
        .then(|| serde_json::json!({ "error": error.to_string() }));

    if status.is_server_error() {
        tracing::error!(
            error = %error,
            http_status = status.as_u16(),
            error_code = code,
            "Request failed with server error"
        );
    } else {
        tracing::warn!(
            error = %error,
            http_status = status.as_u16(),
            error_code = code,
            "Request failed with client error"
        );
    }

    let body = ErrorResponse {
        code: code.to_string(),
        message,
        details,
        request_id: Uuid::new_v4(),
        timestamp: Utc::now(),
    };

    let mut response = (status, Json(body)).into_response();
    if let ApplicationError::RateLimited { retry_after, .. } = error {
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
    }
    response
}

/// Error returned by handlers and extractors, rendered as [`ErrorResponse`]
#[derive(Debug)]
pub struct ApiError(pub ApplicationError);

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error)
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        Self(ApplicationError::Authentication(error))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        application_error_to_response(self.0)
    }
}

/// Request logging middleware
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Processing request"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    response
}

/// Rate limiter state for one action class
#[derive(Clone)]
pub struct RateLimiterState {
    pub service: Arc<RateLimiterService>,
    pub action: ActionClass,
}

impl RateLimiterState {
    pub fn new(service: Arc<RateLimiterService>, action: ActionClass) -> Self {
        Self { service, action }
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("action", &self.action)
            .field("backend", &self.service.backend_name())
            .finish()
    }
}

/// Caller identity for rate limiting: the peer IP address
pub fn extract_caller(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CALLER.to_string())
}

/// Add rate limit headers to response
fn add_rate_limit_headers(response: &mut Response, result: &RateLimitResult) {
    if result.limit == u32::MAX {
        return;
    }

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&result.limit.to_string()) {
        headers.insert("ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&result.remaining_whole().to_string()) {
        headers.insert("ratelimit-remaining", value);
    }
}

fn rate_limited_response(result: &RateLimitResult) -> Response {
    let mut response = application_error_to_response(ApplicationError::RateLimited {
        action: result.action.to_string(),
        retry_after: result.retry_after.unwrap_or(1),
    });
    add_rate_limit_headers(&mut response, result);
    response
}

/// Token bucket admission for one action class.
///
/// The process-wide bucket, when configured, is charged before the caller's
/// own bucket. A denial short-circuits with 429 and the handler never runs.
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.service.is_enabled() {
        return next.run(request).await;
    }

    let caller = extract_caller(&request);

    let global = state.service.check_global().await;
    if !global.allowed {
        tracing::warn!(
            action = %state.action,
            retry_after = ?global.retry_after,
            "Global rate limit exceeded"
        );
        return rate_limited_response(&global);
    }

    let result = state.service.check(state.action, &caller).await;
    if !result.allowed {
        tracing::warn!(
            action = %state.action,
            caller = %caller,
            retry_after = ?result.retry_after,
            "Rate limit exceeded"
        );
        return rate_limited_response(&result);
    }

    let mut response = next.run(request).await;
    add_rate_limit_headers(&mut response, &result);
    response
}

/// Parse `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::MissingCredentials)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

/// State for the access credential check
#[derive(Clone)]
pub struct RequireAuthState {
    pub token_service: Arc<TokenService>,
}

/// Verify the bearer access credential and attach the caller's identity
pub async fn require_auth_middleware(
    State(state): State<Arc<RequireAuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())?;
    let claims = state.token_service.verify(token, TokenKind::Access).await?;
    let email = claims.subject()?;

    tracing::debug!(email = %email, "Access credential verified");
    request.extensions_mut().insert(AuthUser { email, claims });

    Ok(next.run(request).await)
}
