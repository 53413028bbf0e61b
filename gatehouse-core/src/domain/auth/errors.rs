//! Authentication domain errors

use thiserror::Error;

/// Authentication-specific domain errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Unknown email and wrong password share this variant
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Missing or invalid authorization header")]
    MissingCredentials,

    #[error("Invalid token provided")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Email already exists: {email}")]
    EmailAlreadyExists { email: String },

    #[error("Invalid email format: {reason}")]
    InvalidEmail { reason: String },

    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    #[error("Password is too weak - must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    #[error("User not found: {email}")]
    UserNotFound { email: String },

    #[error("Failed to sign token: {message}")]
    TokenSigning { message: String },

    #[error("Password hashing failed: {message}")]
    PasswordHashing { message: String },

    #[error("Revocation store unavailable: {message}")]
    RevocationUnavailable { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },
}

impl AuthError {
    /// Whether the error means the caller failed to authenticate
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::MissingCredentials
                | AuthError::InvalidToken
                | AuthError::TokenExpired
                | AuthError::TokenRevoked
        )
    }
}
