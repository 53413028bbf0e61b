//! Authentication endpoints and extractors

pub mod controller;
pub mod extractors;
pub mod models;

pub use controller::AuthAppState;
pub use extractors::{ApiJson, AuthUser, BearerToken};
