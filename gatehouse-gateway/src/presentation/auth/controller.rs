//! Authentication controller endpoints

use axum::{body::Bytes, extract::State, http::StatusCode, response::Json};
use std::sync::Arc;

use gatehouse_core::application::auth::{
    TokenService,
    use_cases::{LoginUseCase, RegisterUserUseCase},
};
use gatehouse_core::application::errors::ApplicationError;
use gatehouse_core::domain::auth::value_objects::{Email, TokenKind, UserName};

use crate::presentation::auth::extractors::{ApiJson, BearerToken};
use crate::presentation::auth::models::*;
use crate::presentation::middleware::ApiError;
use crate::presentation::models::ErrorResponse;

/// State for auth endpoints
#[derive(Clone)]
pub struct AuthAppState {
    pub register_use_case: Arc<RegisterUserUseCase>,
    pub login_use_case: Arc<LoginUseCase>,
    pub token_service: Arc<TokenService>,
}

/// Register new user endpoint
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AuthAppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let name = UserName::new(request.name)?;
    let email = Email::new(request.email)?;

    state
        .register_use_case
        .execute(name, email, request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AuthAppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = Email::new(request.email)?;
    let result = state
        .login_use_case
        .execute(email, request.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: result.access_token,
        refresh_token: result.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_service.access_ttl_seconds(),
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = RefreshResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Invalid, expired or revoked refresh token", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(state): State<AuthAppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let outcome = state.token_service.refresh(&request.refresh_token).await?;

    Ok(Json(RefreshResponse {
        message: "Token refreshed".to_string(),
        access_token: outcome.access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_service.access_ttl_seconds(),
        refresh_token: outcome.refresh_token,
    }))
}

/// Revoke the presented access token and, optionally, a refresh token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    request_body(content = LogoutRequest, description = "Optional refresh token to revoke"),
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AuthAppState>,
    BearerToken(access_token): BearerToken,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let request = if body.is_empty() {
        LogoutRequest::default()
    } else {
        serde_json::from_slice::<LogoutRequest>(&body).map_err(|e| {
            ApiError(ApplicationError::Validation {
                message: format!("Invalid logout body: {}", e),
            })
        })?
    };

    // An expired access token is already unusable; revoke() treats it as done
    state
        .token_service
        .revoke(&access_token, TokenKind::Access)
        .await?;

    if let Some(refresh) = request.refresh_token {
        match state.token_service.revoke(&refresh, TokenKind::Refresh).await {
            Ok(()) => {}
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("Ignoring unusable refresh token on logout: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Json(MessageResponse::new("Logout successful")))
}
