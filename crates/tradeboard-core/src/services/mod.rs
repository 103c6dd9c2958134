//! Application services - the transport-independent operations of the backend.
//!
//! Each operation takes the requesting principal (when one is required) and
//! structured input, and returns a `DomainError` on failure.

mod auth;
mod posts;
mod publisher;
mod users;

pub use auth::{AuthService, Registration, Session, mask_email};
pub use posts::PostService;
pub use publisher::PostPublisher;
pub use users::{NewAccount, UserAdminService, UserUpdate};

use uuid::Uuid;

use crate::error::DomainError;

/// Parse an id from a path segment. Garbage is `InvalidInput`, not `NotFound`.
pub fn parse_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw.trim()).map_err(|_| DomainError::invalid(format!("invalid id '{raw}'")))
}

const MIN_PASSWORD_LEN: usize = 8;

fn validate_email(email: &str) -> Result<String, DomainError> {
    let email = crate::domain::normalize_email(email);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(DomainError::invalid("email must be a valid address")),
    }
}

fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::invalid("name must not be empty"));
    }
    Ok(())
}
