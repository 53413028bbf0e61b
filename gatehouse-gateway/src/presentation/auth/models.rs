//! Authentication DTOs for API requests and responses

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Register new user request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name, 1-100 characters
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// User email address
    #[schema(example = "newuser@example.com")]
    pub email: String,
    /// User password (minimum 8 characters)
    #[schema(example = "secure_password_123")]
    pub password: String,
}

/// Login request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password
    #[schema(example = "secure_password_123")]
    pub password: String,
}

/// Refresh request DTO
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Optional logout body
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LogoutRequest {
    /// Refresh credential to revoke along with the access credential
    pub refresh_token: Option<String>,
}

/// Plain message response DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logout successful")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Login response DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "Login successful")]
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    #[schema(example = 900)]
    pub expires_in: u64,
}

/// Refresh response DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    #[schema(example = "Token refreshed")]
    pub message: String,
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 900)]
    pub expires_in: u64,
    /// Replacement refresh credential when refresh credentials rotate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}
