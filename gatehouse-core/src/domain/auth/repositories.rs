//! Authentication repository traits

use async_trait::async_trait;

use super::entities::User;
use super::errors::AuthError;
use super::value_objects::Email;

/// User repository trait for user persistence
#[async_trait]
pub trait IUserRepository: Send + Sync {
    /// Find a user by email address
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError>;

    /// Create a new user.
    ///
    /// Returns [`AuthError::EmailAlreadyExists`] when the email is taken.
    async fn create(&self, user: &User) -> Result<(), AuthError>;
}
