use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, PostChanges, User, UserChanges};
use crate::error::RepoError;
use crate::query::{Page, PageRequest, PostFilter, PostSortField, Sort, UserFilter, UserSortField};

/// Generic repository trait shared by every entity store.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique violations surface as `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (already normalized) email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Apply `changes` to the user with `id`. Returns the number of matched rows.
    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<u64, RepoError>;

    /// Returns the number of deleted rows.
    async fn delete(&self, id: Uuid) -> Result<u64, RepoError>;

    async fn list(
        &self,
        filter: &UserFilter,
        sort: &[Sort<UserSortField>],
        page: PageRequest,
    ) -> Result<Page<User>, RepoError>;
}

/// Post repository. Writes are filter-scoped so ownership is enforced in the
/// same statement that mutates the row.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Returns the number of matched rows.
    async fn update(&self, filter: &PostFilter, changes: &PostChanges) -> Result<u64, RepoError>;

    /// Returns the number of deleted rows.
    async fn delete(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    async fn list(
        &self,
        filter: &PostFilter,
        sort: &[Sort<PostSortField>],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    /// Publish every scheduled post whose `scheduled_at <= now`, setting
    /// `published_at` and `updated_at` to `now`. Returns the modified count.
    async fn promote_due(&self, now: chrono::DateTime<chrono::Utc>) -> Result<u64, RepoError>;
}
