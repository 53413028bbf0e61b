//! Application services and error types

pub mod auth;
pub mod errors;
pub mod services;
