//! Application-level error types

use thiserror::Error;

use crate::domain::auth::errors::AuthError;

/// Cache-specific errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthError),

    #[error("Rate limit exceeded for {action}")]
    RateLimited { action: String, retry_after: u64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}
