//! Listing primitives: pagination, sorting and filters.
//!
//! Filters expose a `matches` predicate so every store adapter can agree on the
//! same semantics; the SQL adapter translates the fields, the in-memory one
//! calls `matches` directly.

use std::cmp::Ordering;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Post, PostStatus, PostType, Role, User, Visibility};
use crate::error::DomainError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Out-of-range values fall back to the defaults; `limit` is capped.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        self.request.total_pages(self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// A sortable column, named the way clients spell it.
pub trait SortField: Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub order: SortOrder,
}

impl<F> Sort<F> {
    pub fn asc(field: F) -> Self {
        Self {
            field,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: F) -> Self {
        Self {
            field,
            order: SortOrder::Desc,
        }
    }
}

/// Parse `"a,-b"` into sort keys. A leading `-` means descending.
/// A missing or blank value yields `default`.
pub fn parse_sort<F: SortField>(raw: Option<&str>, default: Sort<F>) -> Result<Vec<Sort<F>>, DomainError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(vec![default]);
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|part| {
            let (order, name) = match part.strip_prefix('-') {
                Some(name) => (SortOrder::Desc, name),
                None => (SortOrder::Asc, part.strip_prefix('+').unwrap_or(part)),
            };
            F::ALL
                .iter()
                .find(|f| f.as_str().eq_ignore_ascii_case(name))
                .map(|field| Sort { field: *field, order })
                .ok_or_else(|| DomainError::invalid(format!("unknown sort field '{name}'")))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSortField {
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    ScheduledAt,
    Title,
}

impl SortField for PostSortField {
    const ALL: &'static [Self] = &[
        PostSortField::CreatedAt,
        PostSortField::UpdatedAt,
        PostSortField::PublishedAt,
        PostSortField::ScheduledAt,
        PostSortField::Title,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PostSortField::CreatedAt => "created_at",
            PostSortField::UpdatedAt => "updated_at",
            PostSortField::PublishedAt => "published_at",
            PostSortField::ScheduledAt => "scheduled_at",
            PostSortField::Title => "title",
        }
    }
}

impl PostSortField {
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        match self {
            PostSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            PostSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            PostSortField::PublishedAt => a.published_at.cmp(&b.published_at),
            PostSortField::ScheduledAt => a.scheduled_at.cmp(&b.scheduled_at),
            PostSortField::Title => a.title.cmp(&b.title),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    CreatedAt,
    Email,
    Name,
    Role,
}

impl SortField for UserSortField {
    const ALL: &'static [Self] = &[
        UserSortField::CreatedAt,
        UserSortField::Email,
        UserSortField::Name,
        UserSortField::Role,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            UserSortField::CreatedAt => "created_at",
            UserSortField::Email => "email",
            UserSortField::Name => "name",
            UserSortField::Role => "role",
        }
    }
}

impl UserSortField {
    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        match self {
            UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            UserSortField::Email => a.email.cmp(&b.email),
            UserSortField::Name => a.name.cmp(&b.name),
            UserSortField::Role => a.role.as_str().cmp(b.role.as_str()),
        }
    }
}

/// Compare two items by a list of sort keys, first key wins.
pub fn compare_by<T, F>(a: &T, b: &T, sort: &[Sort<F>], cmp: impl Fn(&F, &T, &T) -> Ordering) -> Ordering {
    sort.iter()
        .map(|s| s.order.apply(cmp(&s.field, a, b)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Conjunction of post predicates. `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub status: Option<PostStatus>,
    /// Allowed visibilities. An empty list matches nothing.
    pub visibility: Option<Vec<Visibility>>,
    pub post_type: Option<PostType>,
    /// Case-insensitive substring over title and content.
    pub search: Option<String>,
}

impl PostFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.id.is_none_or(|id| post.id == id)
            && self.author_id.is_none_or(|id| post.author_id == id)
            && self.status.is_none_or(|s| post.status == s)
            && self.post_type.is_none_or(|t| post.post_type == t)
            && self
                .visibility
                .as_ref()
                .is_none_or(|allowed| allowed.contains(&post.visibility))
            && self.search.as_ref().is_none_or(|q| {
                let q = q.to_lowercase();
                contains_ci(&post.title, &q) || contains_ci(&post.content, &q)
            })
    }
}

/// Admin user listing filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive substring over email and name.
    pub search: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.role.as_ref().is_none_or(|r| user.role.is(r.as_str()))
            && self.search.as_ref().is_none_or(|q| {
                let q = q.to_lowercase();
                contains_ci(&user.email, &q) || contains_ci(&user.name, &q)
            })
    }
}

/// Raw post listing query, as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub visibility: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Raw user listing query, as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub role: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// Trimmed, non-empty query value.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
