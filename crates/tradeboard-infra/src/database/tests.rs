use std::time::Duration;

use chrono::{TimeDelta, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use tradeboard_core::domain::{Post, PostStatus, User};
use tradeboard_core::error::RepoError;
use tradeboard_core::ports::{BaseRepository, PostRepository, UserRepository};
use tradeboard_core::query::{PageRequest, PostFilter, PostSortField, Sort};

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{PostgresPostRepository, PostgresUserRepository};

fn post_model(id: Uuid, status: &str) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        author_id: Uuid::new_v4(),
        title: "Test Post".to_owned(),
        content: "Content".to_owned(),
        tags: serde_json::json!(["btc", "macro"]),
        visibility: "public".to_owned(),
        post_type: "idea".to_owned(),
        status: status.to_owned(),
        media_urls: serde_json::Value::Null,
        scheduled_at: None,
        published_at: (status == "published").then(|| now.into()),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn find_post_by_id_decodes_columns() {
    let post_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, "published")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let post: Post = repo.find_by_id(post_id).await.unwrap().unwrap();

    assert_eq!(post.id, post_id);
    assert_eq!(post.status, PostStatus::Published);
    assert_eq!(post.tags, vec!["btc".to_string(), "macro".to_string()]);
    assert!(post.media_urls.is_empty());
}

#[tokio::test]
async fn unknown_status_is_corrupt() {
    let post_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, "archived")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result: Result<Option<Post>, RepoError> = repo.find_by_id(post_id).await;

    assert!(matches!(result, Err(RepoError::Corrupt(_))));
}

#[tokio::test]
async fn promote_due_reports_rows_affected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let now = Utc::now();

    assert_eq!(repo.promote_due(now).await.unwrap(), 3);
    assert_eq!(repo.promote_due(now + TimeDelta::seconds(1)).await.unwrap(), 0);
}

#[tokio::test]
async fn scoped_delete_returns_zero_for_foreign_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let filter = PostFilter::by_id(Uuid::new_v4()).owned_by(Uuid::new_v4());

    assert_eq!(repo.delete(&filter).await.unwrap(), 0);
}

#[tokio::test]
async fn list_counts_then_pages() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![std::collections::BTreeMap::from([(
            "num_items".to_string(),
            sea_orm::Value::BigInt(Some(11)),
        )])]])
        .append_query_results([vec![post_model(Uuid::new_v4(), "published")]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo
        .list(
            &PostFilter::default().with_status(PostStatus::Published),
            &[Sort::desc(PostSortField::CreatedAt)],
            PageRequest::new(Some(2), Some(10)),
        )
        .await
        .unwrap();

    assert_eq!(page.total, 11);
    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn find_user_by_email() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user::Model {
            id: Uuid::new_v4(),
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password_hash: "$argon2id$v=19$stub".to_owned(),
            role: "Premium".to_owned(),
            is_active: true,
            created_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user: User = repo.find_by_email("ada@example.com").await.unwrap().unwrap();

    assert_eq!(user.role.as_str(), "premium");
    assert!(user.is_active);
}

#[tokio::test]
async fn store_errors_map_to_query_errors() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([sea_orm::DbErr::Custom("boom".to_string())])
        .into_connection();

    let repo = PostgresUserRepository::with_timeout(db, Duration::from_secs(1));
    let result = repo.find_by_email("x@y.z").await;

    assert!(matches!(result, Err(RepoError::Query(_))));
}
