//! Post handlers: listing, reads, and owner-scoped writes.

use actix_web::{HttpResponse, web};

use tradeboard_core::domain::{NewPost, Post, PostPatch, PostType, Visibility};
use tradeboard_core::query::{Page, PostListParams};
use tradeboard_shared::dto::{CreatePostRequest, PostListResponse, UpdatePostRequest};

use super::{pagination, post_response};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/posts
pub async fn list(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<PostListParams>,
) -> AppResult<HttpResponse> {
    let page = state.posts.list(viewer.principal(), query.into_inner()).await?;
    Ok(list_response(page))
}

/// GET /api/v1/posts/my
pub async fn list_mine(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PostListParams>,
) -> AppResult<HttpResponse> {
    let page = state.posts.list_mine(identity.principal(), query.into_inner()).await?;
    Ok(list_response(page))
}

/// GET /api/v1/posts/{id}
pub async fn get(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get(viewer.principal(), &path).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// POST /api/v1/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let input = NewPost {
        title: req.title,
        content: req.content,
        tags: req.tags,
        visibility: req.visibility.parse()?,
        post_type: req.post_type.parse()?,
        media_urls: req.media_urls,
        scheduled_at: req.scheduled_at,
    };

    let post = state.posts.create(identity.principal(), input).await?;
    Ok(HttpResponse::Created().json(post_response(post)))
}

/// PUT /api/v1/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let patch = PostPatch {
        title: req.title,
        content: req.content,
        tags: req.tags,
        visibility: req.visibility.as_deref().map(str::parse::<Visibility>).transpose()?,
        post_type: req.post_type.as_deref().map(str::parse::<PostType>).transpose()?,
        media_urls: req.media_urls,
        scheduled_at: req.scheduled_at,
    };

    let post = state.posts.update(identity.principal(), &path, patch).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.posts.delete(identity.principal(), &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

fn list_response(page: Page<Post>) -> HttpResponse {
    let pagination = pagination(&page);
    HttpResponse::Ok().json(PostListResponse {
        posts: page.items.into_iter().map(post_response).collect(),
        pagination,
    })
}
