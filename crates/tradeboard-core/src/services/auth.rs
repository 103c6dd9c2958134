use std::sync::Arc;

use chrono::Utc;

use super::{validate_email, validate_password};
use crate::domain::{Role, User, normalize_email};
use crate::error::DomainError;
use crate::ports::{IssuedToken, PasswordService, TokenService, UserRepository};

/// Roles a user may pick for themselves at registration.
const SELF_SERVICE_ROLES: &[&str] = &[Role::FREE, Role::PREMIUM, Role::AUTHOR];

/// Self-service registration input. `name` may be empty.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: IssuedToken,
    pub user: User,
}

/// Credential verification and token issuance.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    #[tracing::instrument(skip_all, fields(email = %mask_email(&input.email)))]
    pub async fn register(&self, input: Registration) -> Result<User, DomainError> {
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;

        let role = match input.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            None => Role::free(),
            Some(r) if Role::new(r).is_admin() => {
                return Err(DomainError::Forbidden("cannot self-assign the admin role".to_string()));
            }
            Some(r) if SELF_SERVICE_ROLES.iter().any(|allowed| Role::new(r).is(allowed)) => Role::new(r),
            Some(r) => return Err(DomainError::invalid(format!("unknown role '{r}'"))),
        };

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("email already registered".to_string()));
        }

        let hash = self.passwords.hash(&input.password)?;
        let user = self.users.insert(User::new(input.name.trim().to_string(), &email, hash, role)).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Every failure path returns the same `Invalid credentials` error.
    #[tracing::instrument(skip_all, fields(email = %mask_email(email)))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, DomainError> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            tracing::debug!("Login for unknown email");
            return Err(DomainError::invalid_credentials());
        };

        if !self.passwords.verify(password, &user.password_hash)? || !user.is_active {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(DomainError::invalid_credentials());
        }

        let token = self.tokens.issue(user.id, &user.role, self.tokens.default_ttl())?;
        tracing::info!(user_id = %user.id, expires_at = %token.expires_at, "User logged in");

        Ok(Session { token, user })
    }

    /// Seconds until the session token expires.
    pub fn expires_in(session: &Session) -> i64 {
        session.token.expires_in(Utc::now())
    }
}

/// `jane@example.com` becomes `j***@example.com`.
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}
