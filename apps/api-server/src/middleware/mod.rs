//! Middleware modules.

pub mod auth;
pub mod error;
pub mod rbac;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;
