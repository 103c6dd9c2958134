//! Post entity for SeaORM.
//!
//! `author_id` is a plain column: posts survive their author and there is no
//! foreign key.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use tradeboard_core::domain::Post;
use tradeboard_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub tags: Json,
    pub visibility: String,
    #[sea_orm(column_name = "type")]
    pub post_type: String,
    pub status: String,
    pub media_urls: Json,
    pub scheduled_at: Option<DateTimeWithTimeZone>,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn corrupt(id: Uuid, what: impl std::fmt::Display) -> RepoError {
    RepoError::Corrupt(format!("post {id}: {what}"))
}

fn strings(id: Uuid, value: Json) -> Result<Vec<String>, RepoError> {
    match value {
        Json::Null => Ok(Vec::new()),
        other => serde_json::from_value(other).map_err(|e| corrupt(id, e)),
    }
}

impl TryFrom<Model> for Post {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = model.id;
        Ok(Self {
            id,
            author_id: model.author_id,
            title: model.title,
            content: model.content,
            tags: strings(id, model.tags)?,
            visibility: model.visibility.parse().map_err(|e| corrupt(id, e))?,
            post_type: model.post_type.parse().map_err(|e| corrupt(id, e))?,
            status: model.status.parse().map_err(|e| corrupt(id, e))?,
            media_urls: strings(id, model.media_urls)?,
            scheduled_at: model.scheduled_at.map(Into::into),
            published_at: model.published_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<Post> for ActiveModel {
    fn from(post: Post) -> Self {
        Self {
            id: Set(post.id),
            author_id: Set(post.author_id),
            title: Set(post.title),
            content: Set(post.content),
            tags: Set(Json::from(post.tags)),
            visibility: Set(post.visibility.as_str().to_string()),
            post_type: Set(post.post_type.as_str().to_string()),
            status: Set(post.status.as_str().to_string()),
            media_urls: Set(Json::from(post.media_urls)),
            scheduled_at: Set(post.scheduled_at.map(Into::into)),
            published_at: Set(post.published_at.map(Into::into)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
