//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use uuid::Uuid;

use tradeboard_core::domain::{Post, PostChanges, PostStatus, User, UserChanges};
use tradeboard_core::error::RepoError;
use tradeboard_core::ports::{BaseRepository, PostRepository, UserRepository};
use tradeboard_core::query::{
    Page, PageRequest, PostFilter, PostSortField, Sort, SortOrder, UserFilter, UserSortField,
};
use tradeboard_core::services::mask_email;

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

fn order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

fn timestamp(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.into()
}

/// `%needle%` with LIKE metacharacters escaped, lowercased.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// `LOWER(col) LIKE pattern` over any of `columns`.
fn search_any<C: ColumnTrait>(columns: &[C], needle: &str) -> Condition {
    let pattern = like_pattern(needle);
    columns.iter().fold(Condition::any(), |cond, col| {
        let lowered: SimpleExpr = Func::lower(Expr::col(*col)).into();
        cond.add(Expr::expr(lowered).like(pattern.as_str()))
    })
}

impl PostgresPostRepository {
    fn condition(filter: &PostFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(id) = filter.id {
            cond = cond.add(post::Column::Id.eq(id));
        }
        if let Some(author_id) = filter.author_id {
            cond = cond.add(post::Column::AuthorId.eq(author_id));
        }
        if let Some(status) = filter.status {
            cond = cond.add(post::Column::Status.eq(status.as_str()));
        }
        if let Some(post_type) = filter.post_type {
            cond = cond.add(post::Column::PostType.eq(post_type.as_str()));
        }
        if let Some(allowed) = &filter.visibility {
            cond = cond.add(post::Column::Visibility.is_in(allowed.iter().map(|v| v.as_str())));
        }
        if let Some(q) = &filter.search {
            cond = cond.add(search_any(&[post::Column::Title, post::Column::Content], q));
        }
        cond
    }

    fn sorted(select: Select<PostEntity>, sort: &[Sort<PostSortField>]) -> Select<PostEntity> {
        sort.iter().fold(select, |select, s| {
            let column = match s.field {
                PostSortField::CreatedAt => post::Column::CreatedAt,
                PostSortField::UpdatedAt => post::Column::UpdatedAt,
                PostSortField::PublishedAt => post::Column::PublishedAt,
                PostSortField::ScheduledAt => post::Column::ScheduledAt,
                PostSortField::Title => post::Column::Title,
            };
            select.order_by(column, order(s.order))
        })
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn update(&self, filter: &PostFilter, changes: &PostChanges) -> Result<u64, RepoError> {
        let mut update = PostEntity::update_many()
            .col_expr(post::Column::UpdatedAt, Expr::value(timestamp(changes.updated_at)));

        if let Some(title) = &changes.title {
            update = update.col_expr(post::Column::Title, Expr::value(title.clone()));
        }
        if let Some(content) = &changes.content {
            update = update.col_expr(post::Column::Content, Expr::value(content.clone()));
        }
        if let Some(tags) = &changes.tags {
            update = update.col_expr(post::Column::Tags, Expr::value(serde_json::Value::from(tags.clone())));
        }
        if let Some(visibility) = changes.visibility {
            update = update.col_expr(post::Column::Visibility, Expr::value(visibility.as_str()));
        }
        if let Some(post_type) = changes.post_type {
            update = update.col_expr(post::Column::PostType, Expr::value(post_type.as_str()));
        }
        if let Some(media) = &changes.media_urls {
            update = update.col_expr(post::Column::MediaUrls, Expr::value(serde_json::Value::from(media.clone())));
        }
        if let Some(schedule) = changes.schedule {
            update = update
                .col_expr(post::Column::Status, Expr::value(schedule.status.as_str()))
                .col_expr(post::Column::ScheduledAt, Expr::value(schedule.scheduled_at.map(timestamp)))
                .col_expr(post::Column::PublishedAt, Expr::value(schedule.published_at.map(timestamp)));
        }

        let result = self.run(update.filter(Self::condition(filter)).exec(&self.db)).await?;
        Ok(result.rows_affected)
    }

    async fn delete(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let result = self
            .run(PostEntity::delete_many().filter(Self::condition(filter)).exec(&self.db))
            .await?;
        Ok(result.rows_affected)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        sort: &[Sort<PostSortField>],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let select = PostEntity::find().filter(Self::condition(filter));
        let total = self.run(select.clone().count(&self.db)).await?;

        let models = self
            .run(
                Self::sorted(select, sort)
                    .offset(page.skip())
                    .limit(page.limit)
                    .all(&self.db),
            )
            .await?;

        let items = models.into_iter().map(Post::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total,
            request: page,
        })
    }

    async fn promote_due(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let now = timestamp(now);
        let result = self
            .run(
                PostEntity::update_many()
                    .col_expr(post::Column::Status, Expr::value(PostStatus::Published.as_str()))
                    .col_expr(post::Column::PublishedAt, Expr::value(now))
                    .col_expr(post::Column::UpdatedAt, Expr::value(now))
                    .filter(post::Column::Status.eq(PostStatus::Scheduled.as_str()))
                    .filter(post::Column::ScheduledAt.lte(now))
                    .exec(&self.db),
            )
            .await?;
        Ok(result.rows_affected)
    }
}

impl PostgresUserRepository {
    fn condition(filter: &UserFilter) -> Condition {
        let mut cond = Condition::all();
        if let Some(role) = &filter.role {
            cond = cond.add(user::Column::Role.eq(role.as_str()));
        }
        if let Some(q) = &filter.search {
            cond = cond.add(search_any(&[user::Column::Email, user::Column::Name], q));
        }
        cond
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        self.run(UserEntity::find().filter(user::Column::Email.eq(email)).one(&self.db))
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<u64, RepoError> {
        if changes.is_empty() {
            let existing: Option<User> = self.find_by_id(id).await?;
            return Ok(u64::from(existing.is_some()));
        }

        let mut update = UserEntity::update_many();
        if let Some(email) = &changes.email {
            update = update.col_expr(user::Column::Email, Expr::value(email.clone()));
        }
        if let Some(role) = &changes.role {
            update = update.col_expr(user::Column::Role, Expr::value(role.to_string()));
        }

        let result = self
            .run(update.filter(user::Column::Id.eq(id)).exec(&self.db))
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete(&self, id: Uuid) -> Result<u64, RepoError> {
        let result = self.run(UserEntity::delete_by_id(id).exec(&self.db)).await?;
        Ok(result.rows_affected)
    }

    async fn list(
        &self,
        filter: &UserFilter,
        sort: &[Sort<UserSortField>],
        page: PageRequest,
    ) -> Result<Page<User>, RepoError> {
        let select = UserEntity::find().filter(Self::condition(filter));
        let total = self.run(select.clone().count(&self.db)).await?;

        let select = sort.iter().fold(select, |select, s| {
            let column = match s.field {
                UserSortField::CreatedAt => user::Column::CreatedAt,
                UserSortField::Email => user::Column::Email,
                UserSortField::Name => user::Column::Name,
                UserSortField::Role => user::Column::Role,
            };
            select.order_by(column, order(s.order))
        });

        let models = self
            .run(select.offset(page.skip()).limit(page.limit).all(&self.db))
            .await?;

        let items = models.into_iter().map(User::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            items,
            total,
            request: page,
        })
    }
}
