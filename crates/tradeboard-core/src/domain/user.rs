use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's role. The set is open; the recognized values have constants.
///
/// Roles are stored trimmed and lowercased, and compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const AUTHOR: &'static str = "author";
    pub const PREMIUM: &'static str = "premium";
    pub const FREE: &'static str = "free";

    pub fn new(role: impl AsRef<str>) -> Self {
        Self(role.as_ref().trim().to_lowercase())
    }

    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    pub fn author() -> Self {
        Self::new(Self::AUTHOR)
    }

    pub fn free() -> Self {
        Self::new(Self::FREE)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive comparison against a role name.
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name.trim())
    }

    pub fn is_admin(&self) -> bool {
        self.is(Self::ADMIN)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User entity - an account that can authenticate and own posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user. The email is normalized.
    pub fn new(name: String, email: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Partial user update. Only email and role are mutable after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.role.is_none()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_comparison_ignores_case() {
        let role = Role::new(" Author ");
        assert_eq!(role.as_str(), "author");
        assert!(role.is("AUTHOR"));
        assert!(!role.is_admin());
    }

    #[test]
    fn new_user_normalizes_email() {
        let user = User::new(
            "Ada".to_string(),
            "  Ada@Example.COM ",
            "hash".to_string(),
            Role::free(),
        );
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_active);
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User::new(
            "Ada".to_string(),
            "ada@example.com",
            "$argon2id$secret".to_string(),
            Role::free(),
        );
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }
}
