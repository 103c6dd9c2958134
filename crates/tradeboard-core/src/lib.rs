//! # Tradeboard Core
//!
//! The domain layer of the Tradeboard backend: users, posts and their
//! publication lifecycle, the access policy, and the services that combine
//! them. Persistence and token signing are reached only through the traits in
//! [`ports`]; nothing in this crate performs IO on its own.

pub mod access;
pub mod domain;
pub mod error;
pub mod ports;
pub mod query;
pub mod services;

pub use access::Principal;
pub use error::DomainError;
