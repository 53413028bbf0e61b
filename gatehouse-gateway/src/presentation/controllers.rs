//! HTTP controllers outside the auth flow

pub mod health;
pub mod profile;

pub use health::{HealthState, health_check};
pub use profile::{ProfileState, get_profile};
