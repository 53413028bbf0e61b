//! Password hashing service using Argon2id

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash as Argon2Hash, PasswordHasher as Argon2Hasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use crate::domain::auth::{errors::AuthError, value_objects::PasswordHash};

/// Password hashing service using Argon2id.
///
/// Hashing and verification run on the blocking pool so concurrent logins
/// do not starve the async runtime.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Create a hasher with the OWASP minimum parameters (19 MiB, t=2, p=1)
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Create a hasher with custom parameters, e.g. cheaper ones in tests
    pub fn with_params(
        memory_cost: u32,
        time_cost: u32,
        parallelism: u32,
    ) -> Result<Self, AuthError> {
        let params = Params::new(memory_cost, time_cost, parallelism, None).map_err(|e| {
            AuthError::PasswordHashing {
                message: format!("invalid Argon2 parameters: {}", e),
            }
        })?;

        Ok(Self { params })
    }

    /// Hash a password
    pub async fn hash(&self, password: String) -> Result<PasswordHash, AuthError> {
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|h| h.to_string())
        })
        .await
        .map_err(|e| {
            tracing::error!("Password hash task panicked: {}", e);
            AuthError::PasswordHashing {
                message: "hashing task failed".to_string(),
            }
        })?
        .map(PasswordHash::from)
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AuthError::PasswordHashing {
                message: e.to_string(),
            }
        })
    }

    /// Verify a password against a stored hash.
    ///
    /// A hash that cannot be parsed verifies as `false`.
    pub async fn verify(&self, password: String, hash: PasswordHash) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || {
            let Ok(parsed_hash) = Argon2Hash::new(hash.as_str()) else {
                tracing::warn!("Stored password hash is not in PHC format");
                return false;
            };

            // Parameters are read back from the PHC string
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .await
        .map_err(|e| {
            tracing::error!("Password verify task panicked: {}", e);
            AuthError::PasswordHashing {
                message: "verification task failed".to_string(),
            }
        })
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
