//! API response models shared across endpoints

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Error response model
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "UNAUTHORIZED")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Invalid email or password")]
    pub message: String,

    /// Additional error context, omitted in production
    #[schema(example = r#"{"error": "Authentication error: Invalid email or password"}"#)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub request_id: Uuid,

    /// Error occurrence timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service health status
    #[schema(example = "healthy")]
    pub status: String,

    /// Current service version
    #[schema(example = "0.3.0")]
    pub version: String,

    /// Health check timestamp
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Backends in use
    #[schema(example = r#"{"rate_limiter": "dragonfly", "cache": "dragonfly"}"#)]
    pub details: Option<serde_json::Value>,
}

/// Profile of the authenticated caller
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(example = "Profile fetched")]
    pub message: String,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
}
