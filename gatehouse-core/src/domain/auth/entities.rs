//! Authentication domain entities

use chrono::{DateTime, Utc};

use super::value_objects::*;

/// User aggregate root
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub name: UserName,
    pub email: Email,
    /// Hashed password (never expose raw hash)
    pub password_hash: PasswordHash,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(name: UserName, email: Email, password_hash: PasswordHash) -> Self {
        Self {
            user_id: UserId::generate(),
            name,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
