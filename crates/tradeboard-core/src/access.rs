//! Access policy: role allow-lists, ownership, and read visibility.
//!
//! Everything here is a pure function of the principal and the resource. No IO.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Post, PostStatus, Role, Visibility};
use crate::ports::TokenClaims;

pub const ADMIN_ONLY: &[&str] = &[Role::ADMIN];
pub const POST_AUTHORS: &[&str] = &[Role::AUTHOR, Role::ADMIN];
pub const PROFILE_ROLES: &[&str] = &[Role::ADMIN, Role::PREMIUM];
pub const AUTHENTICATED: &[&str] = &[];

/// The authenticated requester, as bound from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<TokenClaims> for Principal {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("no role bound to the request")]
    MissingRole,

    #[error("role '{0}' is not allowed")]
    RoleNotAllowed(String),
}

/// Check the principal's role against an allow-list.
///
/// An empty list admits any authenticated principal. Matching ignores case.
pub fn authorize<S: AsRef<str>>(principal: &Principal, allowed: &[S]) -> Result<(), AccessError> {
    if allowed.is_empty() {
        return Ok(());
    }
    if principal.role.is_empty() {
        return Err(AccessError::MissingRole);
    }
    if allowed.iter().any(|r| principal.role.is(r.as_ref())) {
        Ok(())
    } else {
        Err(AccessError::RoleNotAllowed(principal.role.to_string()))
    }
}

/// Author-or-override rule for mutations of owned resources.
#[derive(Debug, Clone)]
pub struct OwnershipPolicy {
    override_roles: Vec<Role>,
}

impl Default for OwnershipPolicy {
    fn default() -> Self {
        Self::new([Role::ADMIN])
    }
}

impl OwnershipPolicy {
    pub fn new<I, S>(override_roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            override_roles: override_roles.into_iter().map(Role::new).collect(),
        }
    }

    /// Whether the principal bypasses ownership entirely.
    pub fn overrides(&self, principal: &Principal) -> bool {
        self.override_roles.iter().any(|r| principal.role.is(r.as_str()))
    }

    pub fn may_mutate(&self, principal: &Principal, owner: Uuid) -> bool {
        principal.user_id == owner || self.overrides(principal)
    }
}

/// Visibilities whose published posts the viewer may read.
pub fn visible_visibilities(viewer: Option<&Principal>) -> Vec<Visibility> {
    match viewer {
        Some(p) if p.is_admin() => Visibility::ALL.to_vec(),
        Some(p) if p.role.is(Role::PREMIUM) => vec![Visibility::Public, Visibility::Premium],
        _ => vec![Visibility::Public],
    }
}

/// Read rule for a single post.
pub fn can_view(viewer: Option<&Principal>, post: &Post) -> bool {
    if viewer.is_some_and(|p| p.is_admin() || p.user_id == post.author_id) {
        return true;
    }
    post.status == PostStatus::Published && visible_visibilities(viewer).contains(&post.visibility)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{NewPost, PostType};

    fn principal(role: &str) -> Principal {
        Principal::new(Uuid::new_v4(), Role::new(role))
    }

    fn post(author: Uuid, visibility: Visibility, published: bool) -> Post {
        let now = Utc::now();
        Post::new(
            author,
            NewPost {
                title: "t".to_string(),
                content: String::new(),
                tags: Vec::new(),
                visibility,
                post_type: PostType::Trade,
                media_urls: Vec::new(),
                scheduled_at: published.then_some(now),
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn author_is_rejected_by_admin_only() {
        let author = principal("author");
        assert_eq!(
            authorize(&author, ADMIN_ONLY),
            Err(AccessError::RoleNotAllowed("author".to_string()))
        );
        assert!(authorize(&author, POST_AUTHORS).is_ok());
    }

    #[test]
    fn role_match_ignores_case() {
        let admin = principal("Admin");
        assert!(authorize(&admin, &["ADMIN"]).is_ok());
    }

    #[test]
    fn empty_allow_list_admits_any_principal() {
        assert!(authorize(&principal("free"), AUTHENTICATED).is_ok());
    }

    #[test]
    fn empty_role_is_rejected() {
        assert_eq!(authorize(&principal(""), POST_AUTHORS), Err(AccessError::MissingRole));
    }

    #[test]
    fn ownership_with_admin_override() {
        let policy = OwnershipPolicy::default();
        let owner = principal("author");
        let other = principal("author");
        let admin = principal("admin");

        assert!(policy.may_mutate(&owner, owner.user_id));
        assert!(!policy.may_mutate(&other, owner.user_id));
        assert!(policy.may_mutate(&admin, owner.user_id));
    }

    #[test]
    fn visibility_rules() {
        let author = Uuid::new_v4();
        let premium_post = post(author, Visibility::Premium, true);
        let private_post = post(author, Visibility::Private, true);
        let public_draft = post(author, Visibility::Public, false);

        assert!(!can_view(None, &premium_post));
        assert!(can_view(Some(&principal("premium")), &premium_post));
        assert!(!can_view(Some(&principal("premium")), &private_post));
        assert!(can_view(Some(&principal("admin")), &private_post));
        assert!(!can_view(Some(&principal("free")), &public_draft));
        assert!(can_view(Some(&Principal::new(author, Role::author())), &public_draft));
    }
}
