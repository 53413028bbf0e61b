//! Authentication value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::errors::AuthError;

/// User ID value object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random UserId
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Email value object with validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Create a new Email with validation. The address is trimmed and lower-cased.
    pub fn new(email: impl Into<String>) -> Result<Self, AuthError> {
        let email = email.into().trim().to_lowercase();
        let invalid = |reason: &str| AuthError::InvalidEmail {
            reason: reason.to_string(),
        };

        if email.is_empty() {
            return Err(invalid("email cannot be empty"));
        }

        let Some((local, domain)) = email.split_once('@') else {
            return Err(invalid("missing @ symbol"));
        };

        if domain.contains('@') {
            return Err(invalid("multiple @ symbols"));
        }

        if local.is_empty() {
            return Err(invalid("empty local part"));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(invalid("domain must contain a dot"));
        }

        if email.len() > 255 {
            return Err(invalid("email too long (max 255 characters)"));
        }

        Ok(Email(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Email {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    const MAX_LEN: usize = 100;

    pub fn new(name: impl Into<String>) -> Result<Self, AuthError> {
        let name = name.into().trim().to_string();

        if name.is_empty() {
            return Err(AuthError::InvalidName {
                reason: "name cannot be empty".to_string(),
            });
        }

        if name.chars().count() > Self::MAX_LEN {
            return Err(AuthError::InvalidName {
                reason: format!("name too long (max {} characters)", Self::MAX_LEN),
            });
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// PHC-formatted password hash. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PasswordHash {
    fn from(hash: String) -> Self {
        Self(hash)
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(***)")
    }
}

/// Kind of credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed claims carried by every credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Subject (user email)
    pub sub: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
    pub typ: TokenKind,
    /// Unique token id, so two credentials issued in the same second differ
    pub jti: String,
}

impl AuthToken {
    pub fn new(subject: &Email, kind: TokenKind, issued_at: i64, expires_at: i64) -> Self {
        Self {
            sub: subject.as_str().to_string(),
            iat: issued_at,
            exp: expires_at,
            typ: kind,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Parse the subject back into an email
    pub fn subject(&self) -> Result<Email, AuthError> {
        Email::new(self.sub.as_str()).map_err(|_| AuthError::InvalidToken)
    }

    /// Seconds until expiry, relative to `now`; zero once expired
    pub fn remaining_lifetime_secs(&self, now: i64) -> u64 {
        u64::try_from(self.exp - now).unwrap_or(0)
    }
}
