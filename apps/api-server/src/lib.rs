//! # Tradeboard API Server
//!
//! Actix-web application: configuration, shared state, middleware, handlers
//! and the background publisher. The binary in `main.rs` only wires these
//! together.

#[cfg(feature = "scheduler")]
pub mod background;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod telemetry;

pub use config::AppConfig;
pub use handlers::configure_routes;
pub use state::AppState;
