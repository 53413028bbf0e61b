//! Gatehouse Core - configuration, domain and services for the Gatehouse gateway
//!
//! # Modules
//!
//! - [`config`] - Strongly-typed configuration with TOML and environment variable support
//! - [`domain`] - Users, credentials and their errors
//! - [`application`] - Token service, authentication use cases and error types
//! - [`infrastructure`] - Rate limiter, cache, user store and credential signing
//! - [`logging`] - Structured logging with tracing
//!
//! # Architecture
//!
//! ```text
//! gatehouse-core/
//! ├── domain/           # Pure business types
//! │   └── auth/         # Entities, value objects, repository traits
//! ├── application/      # Use cases and services
//! │   └── auth/         # Token service, register/login/profile
//! ├── infrastructure/   # External integrations
//! │   ├── rate_limiter/ # Token bucket over Dragonfly/Redis
//! │   ├── cache/        # Dragonfly/Redis and in-memory cache
//! │   └── auth/         # JWT, Argon2, revocation set, PostgreSQL users
//! └── config/           # Configuration management
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use gatehouse_core::Config;
//!
//! let config = Config::load()?;
//! ```
//!
//! Environment variables use the `GATEHOUSE__` prefix with double underscore separators:
//!
//! ```bash
//! GATEHOUSE__SERVER__PORT=3000
//! GATEHOUSE__RATE_LIMIT__CLASSES__LOGIN__CAPACITY=20
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::Config;
pub use logging::init_tracing;
