//! Authentication infrastructure

pub mod jwt_service;
pub mod password_hasher;
pub mod token_blacklist;
pub mod user_repository;

pub use jwt_service::JwtService;
pub use password_hasher::PasswordHasher;
pub use token_blacklist::{CacheTokenBlacklistService, TokenBlacklistService, hash_token};
pub use user_repository::SqlxUserRepository;
