use std::sync::Arc;

use chrono::Utc;

use super::parse_id;
use crate::access::{OwnershipPolicy, POST_AUTHORS, Principal, authorize, can_view, visible_visibilities};
use crate::domain::{NewPost, Post, PostChanges, PostPatch, PostStatus, PostType, Schedule, Visibility};
use crate::error::DomainError;
use crate::ports::PostRepository;
use crate::query::{
    Page, PageRequest, PostFilter, PostListParams, PostSortField, Sort, non_blank, parse_sort,
};

/// The post lifecycle: creation-time status derivation, reads filtered by the
/// access policy, and ownership-scoped writes.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    ownership: OwnershipPolicy,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self::with_policy(posts, OwnershipPolicy::default())
    }

    pub fn with_policy(posts: Arc<dyn PostRepository>, ownership: OwnershipPolicy) -> Self {
        Self { posts, ownership }
    }

    pub async fn create(&self, principal: &Principal, input: NewPost) -> Result<Post, DomainError> {
        authorize(principal, POST_AUTHORS)?;

        let post = Post::new(principal.user_id, input, Utc::now())?;
        let post = self.posts.insert(post).await?;

        tracing::info!(post_id = %post.id, author_id = %post.author_id, status = %post.status, "Post created");
        Ok(post)
    }

    /// Missing and invisible posts are both `NotFound`.
    pub async fn get(&self, viewer: Option<&Principal>, id: &str) -> Result<Post, DomainError> {
        let id = parse_id(id)?;
        self.posts
            .find_by_id(id)
            .await?
            .filter(|post| can_view(viewer, post))
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    /// Public listing. Non-admins only ever see published posts with a
    /// visibility they are entitled to.
    pub async fn list(&self, viewer: Option<&Principal>, params: PostListParams) -> Result<Page<Post>, DomainError> {
        let mut filter = base_filter(&params)?;

        let is_admin = viewer.is_some_and(Principal::is_admin);
        filter.status = match non_blank(&params.status) {
            Some(status) if is_admin => Some(status.parse::<PostStatus>()?),
            _ => Some(PostStatus::Published),
        };

        let visible = visible_visibilities(viewer);
        filter.visibility = Some(match filter.visibility.take() {
            Some(requested) => requested.into_iter().filter(|v| visible.contains(v)).collect(),
            None => visible,
        });

        self.page(&filter, &params).await
    }

    /// The requester's own posts in any status.
    pub async fn list_mine(&self, principal: &Principal, params: PostListParams) -> Result<Page<Post>, DomainError> {
        let mut filter = base_filter(&params)?.owned_by(principal.user_id);
        filter.status = non_blank(&params.status).map(str::parse::<PostStatus>).transpose()?;

        self.page(&filter, &params).await
    }

    pub async fn update(&self, principal: &Principal, id: &str, patch: PostPatch) -> Result<Post, DomainError> {
        let id = parse_id(id)?;
        let post = self.owned(principal, id).await?;

        let now = Utc::now();
        let reschedule = patch.scheduled_at;
        let mut changes = PostChanges::from_patch(patch, now)?;

        let mut filter = self.write_filter(principal, id);
        if let Some(at) = reschedule {
            if post.status == PostStatus::Published {
                return Err(DomainError::invalid("cannot reschedule a published post"));
            }
            changes.schedule = Some(Schedule::from_intent(Some(at), now));
            // Guard against a concurrent promotion between the read and the write.
            filter = filter.with_status(post.status);
        }

        if self.posts.update(&filter, &changes).await? == 0 {
            return Err(match reschedule {
                Some(_) => DomainError::Conflict("post changed while updating".to_string()),
                None => DomainError::not_found("Post", id),
            });
        }

        // Re-read: the publisher may have promoted the post since the first read.
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))?;

        tracing::info!(post_id = %id, user_id = %principal.user_id, status = %post.status, "Post updated");
        Ok(post)
    }

    pub async fn delete(&self, principal: &Principal, id: &str) -> Result<(), DomainError> {
        let id = parse_id(id)?;
        let filter = self.write_filter(principal, id);

        if self.posts.delete(&filter).await? == 0 {
            return Err(DomainError::not_found("Post", id));
        }

        tracing::info!(post_id = %id, user_id = %principal.user_id, "Post deleted");
        Ok(())
    }

    /// Fetch a post the principal may mutate. Foreign posts look missing.
    async fn owned(&self, principal: &Principal, id: uuid::Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .filter(|post| self.ownership.may_mutate(principal, post.author_id))
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    fn write_filter(&self, principal: &Principal, id: uuid::Uuid) -> PostFilter {
        let filter = PostFilter::by_id(id);
        if self.ownership.overrides(principal) {
            filter
        } else {
            filter.owned_by(principal.user_id)
        }
    }

    async fn page(&self, filter: &PostFilter, params: &PostListParams) -> Result<Page<Post>, DomainError> {
        let sort = parse_sort(params.sort.as_deref(), Sort::desc(PostSortField::CreatedAt))?;
        let page = PageRequest::new(params.page, params.limit);
        Ok(self.posts.list(filter, &sort, page).await?)
    }
}

fn base_filter(params: &PostListParams) -> Result<PostFilter, DomainError> {
    Ok(PostFilter {
        post_type: non_blank(&params.post_type).map(str::parse::<PostType>).transpose()?,
        visibility: non_blank(&params.visibility)
            .map(|v| v.parse::<Visibility>().map(|v| vec![v]))
            .transpose()?,
        search: non_blank(&params.search).map(str::to_string),
        ..PostFilter::default()
    })
}
