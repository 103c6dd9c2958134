//! In-memory repositories, used when no database is configured and in tests.
//!
//! They follow the same filter, sort and paging rules as the Postgres stores.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use tradeboard_core::domain::{Post, PostChanges, User, UserChanges};
use tradeboard_core::error::RepoError;
use tradeboard_core::ports::{BaseRepository, PostRepository, UserRepository};
use tradeboard_core::query::{
    Page, PageRequest, PostFilter, PostSortField, Sort, UserFilter, UserSortField, compare_by,
};

fn paginate<T: Clone>(mut items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    let items = if skip >= items.len() {
        Vec::new()
    } else {
        items.drain(skip..).take(limit).collect()
    };
    Page {
        items,
        total,
        request: page,
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("users_email_key".to_string()));
        }
        if users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<u64, RepoError> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(RepoError::Constraint("users_email_key".to_string()));
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(0);
        };
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        if let Some(role) = &changes.role {
            user.role = role.clone();
        }
        Ok(1)
    }

    async fn delete(&self, id: Uuid) -> Result<u64, RepoError> {
        Ok(u64::from(self.users.write().await.remove(&id).is_some()))
    }

    async fn list(
        &self,
        filter: &UserFilter,
        sort: &[Sort<UserSortField>],
        page: PageRequest,
    ) -> Result<Page<User>, RepoError> {
        let mut matched: Vec<User> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare_by(a, b, sort, |f, a, b| f.compare(a, b)));
        Ok(paginate(matched, page))
    }
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts_pkey".to_string()));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn update(&self, filter: &PostFilter, changes: &PostChanges) -> Result<u64, RepoError> {
        let mut posts = self.posts.write().await;
        let mut matched = 0;
        for post in posts.values_mut().filter(|p| filter.matches(p)) {
            post.apply(changes);
            matched += 1;
        }
        Ok(matched)
    }

    async fn delete(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|_, p| !filter.matches(p));
        Ok((before - posts.len()) as u64)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: &[Sort<PostSortField>],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let mut matched: Vec<Post> = self
            .posts
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matched.sort_by(|a, b| compare_by(a, b, sort, |f, a, b| f.compare(a, b)));
        Ok(paginate(matched, page))
    }

    async fn promote_due(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut posts = self.posts.write().await;
        let mut promoted = 0;
        for post in posts.values_mut() {
            if post.promote(now) {
                promoted += 1;
            }
        }
        Ok(promoted)
    }
}
