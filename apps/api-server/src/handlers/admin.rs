//! User administration. Every route is behind the admin role gate.

use actix_web::{HttpResponse, web};

use tradeboard_core::query::UserListParams;
use tradeboard_core::services::{NewAccount, UserUpdate};
use tradeboard_shared::dto::{CreateUserRequest, UpdateUserRequest, UserListResponse};

use super::{pagination, user_response};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/admin/users
pub async fn list_users(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<UserListParams>,
) -> AppResult<HttpResponse> {
    let page = state.users.list(identity.principal(), query.into_inner()).await?;
    let pagination = pagination(&page);

    Ok(HttpResponse::Ok().json(UserListResponse {
        users: page.items.into_iter().map(user_response).collect(),
        pagination,
    }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = state.users.get(identity.principal(), &path).await?;
    Ok(HttpResponse::Ok().json(user_response(user)))
}

/// POST /api/v1/admin/users
pub async fn create_user(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .users
        .create(
            identity.principal(),
            NewAccount {
                name: req.name,
                email: req.email,
                password: req.password,
                role: req.role,
                is_active: req.is_active,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(user_response(user)))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .users
        .update(
            identity.principal(),
            &path,
            UserUpdate {
                email: req.email,
                role: req.role,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(user_response(user)))
}

/// DELETE /api/v1/admin/users/{id}
pub async fn delete_user(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.users.delete(identity.principal(), &path).await?;
    Ok(HttpResponse::NoContent().finish())
}
