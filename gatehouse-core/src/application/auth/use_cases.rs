//! Authentication use cases

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::token_service::TokenService;
use crate::application::errors::ApplicationError;
use crate::application::services::CacheService;
use crate::domain::auth::{
    entities::User,
    errors::AuthError,
    repositories::IUserRepository,
    value_objects::{Email, PasswordHash, UserName},
};
use crate::infrastructure::auth::PasswordHasher;
use crate::infrastructure::cache::CacheBackend;

/// Result type for login operations
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub access_token: String,
    pub refresh_token: String,
    pub email: Email,
}

/// Use case for registering new users
pub struct RegisterUserUseCase {
    user_repository: Arc<dyn IUserRepository>,
    password_hasher: Arc<PasswordHasher>,
    min_password_length: usize,
}

impl RegisterUserUseCase {
    pub fn new(
        user_repository: Arc<dyn IUserRepository>,
        password_hasher: Arc<PasswordHasher>,
        min_password_length: usize,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            min_password_length,
        }
    }

    /// Duplicate emails are rejected by the store's unique constraint
    pub async fn execute(
        &self,
        name: UserName,
        email: Email,
        password: String,
    ) -> Result<User, AuthError> {
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::WeakPassword {
                min_length: self.min_password_length,
            });
        }

        let password_hash = self.password_hasher.hash(password).await?;
        let user = User::new(name, email, password_hash);

        self.user_repository.create(&user).await?;

        info!(user_id = %user.user_id, "User registered");
        Ok(user)
    }
}

/// Password behind the decoy hash checked for unknown emails
const DECOY_PASSWORD: &str = "gatehouse-decoy-credential";

/// Use case for user login
pub struct LoginUseCase {
    user_repository: Arc<dyn IUserRepository>,
    password_hasher: Arc<PasswordHasher>,
    token_service: Arc<TokenService>,
    decoy_hash: OnceCell<PasswordHash>,
}

impl LoginUseCase {
    pub fn new(
        user_repository: Arc<dyn IUserRepository>,
        password_hasher: Arc<PasswordHasher>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            token_service,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Unknown email and wrong password both fail with `InvalidCredentials`.
    ///
    /// An unknown email still pays for one Argon2 verification, against a
    /// decoy hash made with the same parameters as real ones.
    pub async fn execute(&self, email: Email, password: String) -> Result<LoginResult, AuthError> {
        let Some(user) = self.user_repository.find_by_email(&email).await? else {
            let decoy = self.decoy_hash().await?;
            self.password_hasher.verify(password, decoy.clone()).await?;
            debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = self
            .password_hasher
            .verify(password, user.password_hash.clone())
            .await?;

        if !is_valid {
            debug!(user_id = %user.user_id, "Password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.token_service.issue_pair(&user.email)?;

        Ok(LoginResult {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            email: user.email,
        })
    }

    async fn decoy_hash(&self) -> Result<&PasswordHash, AuthError> {
        self.decoy_hash
            .get_or_try_init(|| self.password_hasher.hash(DECOY_PASSWORD.to_string()))
            .await
    }
}

/// Public profile of a user, as cached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.as_str().to_string(),
            name: user.name.as_str().to_string(),
        }
    }
}

/// Read-through profile lookup.
///
/// Cache failures are logged and fall through to the user store.
pub struct GetProfileUseCase<C: CacheService = CacheBackend> {
    user_repository: Arc<dyn IUserRepository>,
    cache: Arc<C>,
    ttl: Duration,
}

impl<C: CacheService> GetProfileUseCase<C> {
    pub fn new(user_repository: Arc<dyn IUserRepository>, cache: Arc<C>, ttl: Duration) -> Self {
        Self {
            user_repository,
            cache,
            ttl,
        }
    }

    fn cache_key(email: &Email) -> String {
        format!("profile:{}", email)
    }

    pub async fn execute(&self, email: &Email) -> Result<UserProfile, ApplicationError> {
        let key = Self::cache_key(email);

        match self.cache.get::<UserProfile>(&key).await {
            Ok(Some(profile)) => {
                debug!(key = %key, "Profile served from cache");
                return Ok(profile);
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, "Profile cache read failed: {}", e),
        }

        let user = self
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or_else(|| ApplicationError::NotFound {
                resource: "user".to_string(),
            })?;
        let profile = UserProfile::from(&user);

        if let Err(e) = self.cache.set(&key, &profile, self.ttl).await {
            warn!(key = %key, "Profile cache write failed: {}", e);
        }

        Ok(profile)
    }
}
