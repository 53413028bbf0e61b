//! Request extractors for authenticated routes and JSON bodies

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use gatehouse_core::application::errors::ApplicationError;
use gatehouse_core::domain::auth::{
    errors::AuthError,
    value_objects::{AuthToken, Email},
};

use crate::presentation::middleware::{ApiError, extract_bearer};

/// Identity of the verified caller.
///
/// Inserted by `require_auth_middleware`; a route without that layer
/// rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub email: Email,
    pub claims: AuthToken,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::from(AuthError::MissingCredentials))
    }
}

/// Raw bearer credential from the `Authorization` header, not yet verified
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers)?;
        Ok(BearerToken(token.to_string()))
    }
}

/// JSON body whose rejections render as 400 [`ErrorResponse`](crate::presentation::models::ErrorResponse)
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError(ApplicationError::Validation {
                message: rejection.body_text(),
            })),
        }
    }
}
