//! HTTP presentation layer

pub mod auth;
pub mod controllers;
pub mod middleware;
pub mod models;
pub mod routes;

pub use controllers::*;
pub use middleware::{
    ApiError, RateLimiterState, RequireAuthState, application_error_to_response,
    logging_middleware, rate_limit_middleware, require_auth_middleware,
};
pub use models::*;
pub use routes::{GatewayState, create_router};
