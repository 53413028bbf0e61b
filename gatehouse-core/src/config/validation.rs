//! Configuration validation module

use crate::config::{
    AuthConfig, BucketConfig, CacheConfig, Config, DatabaseConfig, LoggingConfig,
    RateLimitConfig, ServerConfig,
};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Server configuration error: {message}")]
    Server { message: String },

    #[error("Cache configuration error: {message}")]
    Cache { message: String },

    #[error("Rate limit configuration error: {message}")]
    RateLimit { message: String },

    #[error("Authentication configuration error: {message}")]
    Auth { message: String },

    #[error("Database configuration error: {message}")]
    Database { message: String },

    #[error("Logging configuration error: {message}")]
    Logging { message: String },
}

impl ValidationError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.cache.validate()?;
        self.rate_limit.validate()?;
        self.auth.validate()?;
        self.database.validate()?;
        self.logging.validate()
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        // u16 cannot exceed 65535, so only 0 is out of range
        if self.port == 0 {
            return Err(ValidationError::server(format!(
                "Port must be in range 1-65535, got {}",
                self.port
            )));
        }

        if self.host.is_empty() {
            return Err(ValidationError::server("Host cannot be empty"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(ValidationError::server(
                "Request timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for CacheConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.dragonfly_url.starts_with("redis://") && !self.dragonfly_url.starts_with("rediss://")
        {
            return Err(ValidationError::cache(format!(
                "Dragonfly URL must start with redis:// or rediss://, got: {}",
                self.dragonfly_url
            )));
        }

        if self.operation_timeout_ms == 0 {
            return Err(ValidationError::cache(
                "Cache operation timeout must be greater than 0 milliseconds",
            ));
        }

        if self.profile_ttl_seconds == 0 {
            return Err(ValidationError::cache(
                "Profile cache TTL must be greater than 0 seconds",
            ));
        }

        Ok(())
    }
}

fn validate_bucket(name: &str, bucket: &BucketConfig) -> Result<(), ValidationError> {
    if bucket.capacity == 0 {
        return Err(ValidationError::rate_limit(format!(
            "{} capacity must be greater than 0",
            name
        )));
    }

    if !bucket.refill_per_minute.is_finite() || bucket.refill_per_minute <= 0.0 {
        return Err(ValidationError::rate_limit(format!(
            "{} refill_per_minute must be a positive number, got {}",
            name, bucket.refill_per_minute
        )));
    }

    Ok(())
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.store_timeout_ms == 0 {
            return Err(ValidationError::rate_limit(
                "Store timeout must be greater than 0 milliseconds",
            ));
        }

        if self.cleanup_interval_seconds == 0 {
            return Err(ValidationError::rate_limit(
                "Cleanup interval must be greater than 0 seconds",
            ));
        }

        let classes = &self.classes;
        validate_bucket("register", &classes.register)?;
        validate_bucket("login", &classes.login)?;
        validate_bucket("refresh", &classes.refresh)?;
        validate_bucket("logout", &classes.logout)?;
        validate_bucket("profile", &classes.profile)?;
        if let Some(global) = &classes.global {
            validate_bucket("global", global)?;
        }

        Ok(())
    }
}

impl Validate for AuthConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.jwt_secret.len() < 16 {
            return Err(ValidationError::auth(
                "JWT secret must be at least 16 characters long",
            ));
        }

        if let Some(refresh_secret) = &self.refresh_secret
            && refresh_secret.len() < 16
        {
            return Err(ValidationError::auth(
                "Refresh secret must be at least 16 characters long",
            ));
        }

        if self.access_token_ttl_minutes == 0 {
            return Err(ValidationError::auth(
                "Access token TTL must be greater than 0 minutes",
            ));
        }

        if self.refresh_token_ttl_days == 0 {
            return Err(ValidationError::auth(
                "Refresh token TTL must be greater than 0 days",
            ));
        }

        if self.min_password_length == 0 {
            return Err(ValidationError::auth(
                "Minimum password length must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::database("Database URL cannot be empty"));
        }

        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ValidationError::database(
                "Database URL must start with postgres:// or postgresql://",
            ));
        }

        if self.max_connections == 0 {
            return Err(ValidationError::database(
                "Max connections must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.format.as_str(), "json" | "pretty" | "compact") {
            return Err(ValidationError::logging(format!(
                "Unknown log format '{}', expected json, pretty or compact",
                self.format
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionClassLimits;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_server_config_validation() {
        let valid = ServerConfig::default();
        assert!(valid.validate().is_ok());

        let invalid = ServerConfig {
            port: 0,
            ..valid.clone()
        };
        assert!(invalid.validate().is_err());

        let invalid = ServerConfig {
            request_timeout_seconds: 0,
            ..valid.clone()
        };
        assert!(invalid.validate().is_err());

        let invalid = ServerConfig {
            host: String::new(),
            ..valid
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_rate_limit_rejects_zero_refill() {
        let config = RateLimitConfig {
            classes: ActionClassLimits {
                login: BucketConfig::new(10, 0.0),
                ..ActionClassLimits::default()
            },
            ..RateLimitConfig::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("login"));
    }

    #[test]
    fn test_rate_limit_rejects_zero_capacity_global() {
        let config = RateLimitConfig {
            classes: ActionClassLimits {
                global: Some(BucketConfig::new(0, 120.0)),
                ..ActionClassLimits::default()
            },
            ..RateLimitConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_auth_config_validation() {
        let short_secret = AuthConfig {
            jwt_secret: "short".to_string(),
            ..AuthConfig::default()
        };
        assert!(short_secret.validate().is_err());

        let short_refresh_secret = AuthConfig {
            refresh_secret: Some("short".to_string()),
            ..AuthConfig::default()
        };
        assert!(short_refresh_secret.validate().is_err());

        let zero_ttl = AuthConfig {
            access_token_ttl_minutes: 0,
            ..AuthConfig::default()
        };
        assert!(zero_ttl.validate().is_err());
    }

    #[test]
    fn test_database_url_scheme() {
        let invalid = DatabaseConfig {
            url: "mysql://localhost/db".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_logging_format() {
        let invalid = LoggingConfig {
            format: "xml".to_string(),
            ..LoggingConfig::default()
        };
        assert!(invalid.validate().is_err());
    }
}
