//! Credential issuance, verification and revocation
//!
//! Credentials are self-verifying; the revocation set in the shared cache is
//! what lets logout take effect before a credential's natural expiry.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::{AuthConfig, RefreshPolicy};
use crate::domain::auth::{
    errors::AuthError,
    value_objects::{AuthToken, Email, TokenKind},
};
use crate::infrastructure::auth::{JwtService, TokenBlacklistService, hash_token};

/// Access and refresh credentials issued together at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of exchanging a refresh credential
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub access_token: String,
    /// Replacement refresh credential, only under [`RefreshPolicy::Rotate`]
    pub refresh_token: Option<String>,
}

/// Issues, verifies and revokes credentials
pub struct TokenService {
    jwt: Arc<JwtService>,
    blacklist: Arc<dyn TokenBlacklistService>,
    refresh_policy: RefreshPolicy,
    revocation_fail_open: bool,
}

impl TokenService {
    pub fn new(
        jwt: Arc<JwtService>,
        blacklist: Arc<dyn TokenBlacklistService>,
        refresh_policy: RefreshPolicy,
        revocation_fail_open: bool,
    ) -> Self {
        Self {
            jwt,
            blacklist,
            refresh_policy,
            revocation_fail_open,
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        jwt: Arc<JwtService>,
        blacklist: Arc<dyn TokenBlacklistService>,
    ) -> Self {
        Self::new(
            jwt,
            blacklist,
            config.refresh_policy,
            config.revocation_fail_open,
        )
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh_policy
    }

    /// Access credential lifetime in seconds, reported as `expires_in`
    pub fn access_ttl_seconds(&self) -> u64 {
        self.jwt.access_ttl_seconds()
    }

    pub fn issue_access(&self, subject: &Email) -> Result<String, AuthError> {
        self.jwt.generate_access_token(subject)
    }

    pub fn issue_refresh(&self, subject: &Email) -> Result<String, AuthError> {
        self.jwt.generate_refresh_token(subject)
    }

    pub fn issue_pair(&self, subject: &Email) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access(subject)?,
            refresh_token: self.issue_refresh(subject)?,
        })
    }

    /// Whether verification of `kind` consults the revocation set
    fn checks_revocation(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Access => true,
            TokenKind::Refresh => self.refresh_policy == RefreshPolicy::Rotate,
        }
    }

    /// Verify signature, expiry and kind, then revocation where it applies.
    ///
    /// Fails with `InvalidToken`, `TokenExpired` or `TokenRevoked`. A
    /// revocation lookup failure is `RevocationUnavailable` unless the
    /// service is configured to fail open.
    pub async fn verify(&self, token: &str, kind: TokenKind) -> Result<AuthToken, AuthError> {
        let claims = self.jwt.validate_token(token, kind)?;

        if self.checks_revocation(kind) {
            let token_id = hash_token(token);
            match self.blacklist.is_blacklisted(&token_id).await {
                Ok(true) => {
                    debug!(token_id = %token_id, kind = %kind, "Rejected revoked token");
                    return Err(AuthError::TokenRevoked);
                }
                Ok(false) => {}
                Err(e) if self.revocation_fail_open => {
                    warn!(kind = %kind, "Revocation lookup failed, accepting token: {}", e);
                }
                Err(e) => {
                    error!(kind = %kind, "Revocation lookup failed, rejecting token: {}", e);
                    return Err(AuthError::RevocationUnavailable {
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(claims)
    }

    /// Revoke a credential for the rest of its lifetime.
    ///
    /// Idempotent. A credential that has already expired needs no entry and
    /// is accepted as a no-op.
    pub async fn revoke(&self, token: &str, kind: TokenKind) -> Result<(), AuthError> {
        let claims = match self.jwt.validate_token(token, kind) {
            Ok(claims) => claims,
            Err(AuthError::TokenExpired) => {
                debug!(kind = %kind, "Skipping revocation of expired token");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let ttl = Duration::from_secs(claims.remaining_lifetime_secs(Utc::now().timestamp()).max(1));
        let token_id = hash_token(token);

        self.blacklist
            .blacklist_token(&token_id, ttl)
            .await
            .map_err(|e| {
                error!(token_id = %token_id, "Failed to revoke token: {}", e);
                AuthError::RevocationUnavailable {
                    message: e.to_string(),
                }
            })?;

        debug!(token_id = %token_id, kind = %kind, ttl_secs = ttl.as_secs(), "Token revoked");
        Ok(())
    }

    /// Exchange a refresh credential for a new access credential.
    ///
    /// Under `Reusable` the refresh credential stays valid. Under `Rotate`
    /// it is claimed atomically, so only one of several concurrent
    /// exchanges succeeds, and a replacement is returned.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutcome, AuthError> {
        match self.refresh_policy {
            RefreshPolicy::Reusable => {
                let claims = self.verify(refresh_token, TokenKind::Refresh).await?;
                let subject = claims.subject()?;

                Ok(RefreshOutcome {
                    access_token: self.issue_access(&subject)?,
                    refresh_token: None,
                })
            }
            RefreshPolicy::Rotate => {
                let claims = self.jwt.validate_token(refresh_token, TokenKind::Refresh)?;
                let subject = claims.subject()?;

                let ttl = Duration::from_secs(
                    claims
                        .remaining_lifetime_secs(Utc::now().timestamp())
                        .max(1),
                );
                let token_id = hash_token(refresh_token);
                let claimed = self
                    .blacklist
                    .claim_token(&token_id, ttl)
                    .await
                    .map_err(|e| {
                        error!(token_id = %token_id, "Failed to claim refresh token: {}", e);
                        AuthError::RevocationUnavailable {
                            message: e.to_string(),
                        }
                    })?;

                if !claimed {
                    warn!(token_id = %token_id, "Refresh token reuse rejected");
                    return Err(AuthError::TokenRevoked);
                }

                let pair = self.issue_pair(&subject)?;
                Ok(RefreshOutcome {
                    access_token: pair.access_token,
                    refresh_token: Some(pair.refresh_token),
                })
            }
        }
    }
}
