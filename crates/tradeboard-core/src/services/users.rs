use std::sync::Arc;

use super::{parse_id, validate_email, validate_name, validate_password};
use crate::access::{ADMIN_ONLY, PROFILE_ROLES, Principal, authorize};
use crate::domain::{Role, User, UserChanges};
use crate::error::DomainError;
use crate::ports::{PasswordService, UserRepository};
use crate::query::{Page, PageRequest, Sort, UserFilter, UserListParams, UserSortField, non_blank, parse_sort};

/// Admin-side account creation. Any role may be assigned.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub is_active: Option<bool>,
}

/// Admin-side partial update, as received.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub role: Option<String>,
}

/// User administration and the self-profile read.
#[derive(Clone)]
pub struct UserAdminService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
}

impl UserAdminService {
    pub fn new(users: Arc<dyn UserRepository>, passwords: Arc<dyn PasswordService>) -> Self {
        Self { users, passwords }
    }

    pub async fn list(&self, principal: &Principal, params: UserListParams) -> Result<Page<User>, DomainError> {
        authorize(principal, ADMIN_ONLY)?;

        let filter = UserFilter {
            role: non_blank(&params.role).map(Role::new),
            search: non_blank(&params.search).map(str::to_string),
        };
        let sort = parse_sort(params.sort.as_deref(), Sort::desc(UserSortField::CreatedAt))?;
        let page = PageRequest::new(params.page, params.limit);

        Ok(self.users.list(&filter, &sort, page).await?)
    }

    pub async fn get(&self, principal: &Principal, id: &str) -> Result<User, DomainError> {
        authorize(principal, ADMIN_ONLY)?;
        let id = parse_id(id)?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn create(&self, principal: &Principal, input: NewAccount) -> Result<User, DomainError> {
        authorize(principal, ADMIN_ONLY)?;
        validate_name(&input.name)?;
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;
        let role = Role::new(&input.role);
        if role.is_empty() {
            return Err(DomainError::invalid("role must not be empty"));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("email already registered".to_string()));
        }

        let hash = self.passwords.hash(&input.password)?;
        let mut user = User::new(input.name, &email, hash, role);
        if let Some(active) = input.is_active {
            user.is_active = active;
        }
        let user = self.users.insert(user).await?;

        tracing::info!(admin_id = %principal.user_id, user_id = %user.id, role = %user.role, "User created by admin");
        Ok(user)
    }

    /// Only email and role can change.
    pub async fn update(&self, principal: &Principal, id: &str, input: UserUpdate) -> Result<User, DomainError> {
        authorize(principal, ADMIN_ONLY)?;
        let id = parse_id(id)?;

        let changes = UserChanges {
            email: non_blank(&input.email).map(validate_email).transpose()?,
            role: non_blank(&input.role).map(Role::new),
        };
        if changes.is_empty() {
            return Err(DomainError::invalid("nothing to update"));
        }

        if let Some(email) = &changes.email {
            let taken = self.users.find_by_email(email).await?;
            if taken.is_some_and(|other| other.id != id) {
                return Err(DomainError::Conflict("email already registered".to_string()));
            }
        }

        if self.users.update(id, &changes).await? == 0 {
            return Err(DomainError::not_found("User", id));
        }

        tracing::info!(admin_id = %principal.user_id, user_id = %id, "User updated by admin");
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), DomainError> {
        authorize(principal, ADMIN_ONLY)?;
        let id = parse_id(id)?;

        if self.users.delete(id).await? == 0 {
            return Err(DomainError::not_found("User", id));
        }

        tracing::info!(admin_id = %principal.user_id, user_id = %id, "User deleted by admin");
        Ok(())
    }

    /// The stored record of the requesting user.
    pub async fn profile(&self, principal: &Principal) -> Result<User, DomainError> {
        authorize(principal, PROFILE_ROLES)?;
        self.users
            .find_by_id(principal.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", principal.user_id))
    }
}
