//! # Tradeboard Shared
//!
//! Wire types shared by the server and its clients. Kept free of domain
//! dependencies so it can be compiled for any client target.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
