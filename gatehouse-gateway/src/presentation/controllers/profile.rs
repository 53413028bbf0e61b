//! Profile endpoint for authenticated callers

use axum::{extract::State, response::Json};
use std::sync::Arc;

use gatehouse_core::application::auth::use_cases::GetProfileUseCase;

use crate::presentation::auth::extractors::AuthUser;
use crate::presentation::middleware::ApiError;
use crate::presentation::models::{ErrorResponse, ProfileResponse};

#[derive(Clone)]
pub struct ProfileState {
    pub get_profile_use_case: Arc<GetProfileUseCase>,
}

/// Get the authenticated caller's profile
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Profile fetched", body = ProfileResponse),
        (status = 401, description = "Missing, invalid or revoked access token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<ProfileState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.get_profile_use_case.execute(&user.email).await?;

    Ok(Json(ProfileResponse {
        message: "Profile fetched".to_string(),
        email: profile.email,
        name: profile.name,
    }))
}
