//! Gatehouse - rate-limited, token-authenticated service boundary
//!
//! This is the main binary crate that wires the core services into the gateway router

mod app;

pub use app::{AppHandle, build_gateway_state, create_app, drain_background_tasks};
pub use gatehouse_core::{Config, init_tracing};
pub use gatehouse_gateway::GatewayState;

pub use gatehouse_core;
pub use gatehouse_gateway;
