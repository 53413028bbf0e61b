//! JWT service for token generation and validation

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::domain::auth::{
    errors::AuthError,
    value_objects::{AuthToken, Email, TokenKind},
};

/// JWT service for generating and validating tokens
#[derive(Clone)]
pub struct JwtService {
    access_secret: Arc<String>,
    /// Same as `access_secret` unless a dedicated refresh secret is configured
    refresh_secret: Arc<String>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(
        secret: String,
        refresh_secret: Option<String>,
        access_ttl_minutes: u64,
        refresh_ttl_days: u64,
    ) -> Self {
        let access_secret = Arc::new(secret);
        let refresh_secret = match refresh_secret {
            Some(secret) => Arc::new(secret),
            None => Arc::clone(&access_secret),
        };

        Self {
            access_secret,
            refresh_secret,
            access_ttl: Duration::minutes(access_ttl_minutes as i64),
            refresh_ttl: Duration::days(refresh_ttl_days as i64),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.refresh_secret.clone(),
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days,
        )
    }

    /// Access token lifetime in seconds
    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl.num_seconds().max(0) as u64
    }

    fn secret_for(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Generate an access token for a subject
    pub fn generate_access_token(&self, subject: &Email) -> Result<String, AuthError> {
        self.generate_token_at(subject, TokenKind::Access, Utc::now())
    }

    /// Generate a refresh token for a subject
    pub fn generate_refresh_token(&self, subject: &Email) -> Result<String, AuthError> {
        self.generate_token_at(subject, TokenKind::Refresh, Utc::now())
    }

    /// Generate a token as if issued at `issued_at`
    pub fn generate_token_at(
        &self,
        subject: &Email,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let exp = issued_at + self.ttl_for(kind);
        let claims = AuthToken::new(subject, kind, issued_at.timestamp(), exp.timestamp());

        let encoding_key = EncodingKey::from_secret(self.secret_for(kind));

        encode(&Header::default(), &claims, &encoding_key).map_err(|e| {
            tracing::error!(kind = %kind, "Failed to encode JWT token: {}", e);
            AuthError::TokenSigning {
                message: e.to_string(),
            }
        })
    }

    /// Validate signature, expiry and kind, returning the claims
    pub fn validate_token(&self, token: &str, expected: TokenKind) -> Result<AuthToken, AuthError> {
        let decoding_key = DecodingKey::from_secret(self.secret_for(expected));
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let claims = decode::<AuthToken>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?;

        if claims.typ != expected {
            tracing::debug!(expected = %expected, actual = %claims.typ, "Token kind mismatch");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}
