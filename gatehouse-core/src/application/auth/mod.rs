//! Authentication application layer

pub mod token_service;
pub mod use_cases;

pub use token_service::{RefreshOutcome, TokenPair, TokenService};
