//! HTTP handlers and route configuration.

mod admin;
mod auth;
mod health;
mod posts;
mod protected;
mod users;

use actix_web::web;

use tradeboard_core::access::{ADMIN_ONLY, POST_AUTHORS, PROFILE_ROLES};
use tradeboard_core::domain::{Post, User};
use tradeboard_core::query::Page;
use tradeboard_shared::dto::{Pagination, PostResponse, UserResponse};

use crate::middleware::error::bad_request_handler;
use crate::middleware::rbac::RequireRole;

/// Configure all application routes under `/api/v1`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(bad_request_handler))
        .app_data(web::QueryConfig::default().error_handler(bad_request_handler))
        .app_data(web::PathConfig::default().error_handler(bad_request_handler))
        .service(
            web::scope("/api/v1")
                // Public routes
                .route("/health", web::get().to(health::health_check))
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/logout", web::post().to(auth::logout)),
                )
                // Authenticated routes
                .route("/protected", web::get().to(protected::protected))
                .service(
                    web::resource("/users/profile")
                        .wrap(RequireRole::any_of(PROFILE_ROLES))
                        .route(web::get().to(users::profile)),
                )
                // Admin routes
                .service(
                    web::scope("/admin")
                        .wrap(RequireRole::any_of(ADMIN_ONLY))
                        .service(
                            web::resource("/users")
                                .route(web::get().to(admin::list_users))
                                .route(web::post().to(admin::create_user)),
                        )
                        .service(
                            web::resource("/users/{id}")
                                .route(web::get().to(admin::get_user))
                                .route(web::put().to(admin::update_user))
                                .route(web::delete().to(admin::delete_user)),
                        ),
                )
                // Posts; `/posts/my` must be registered before `/posts/{id}`
                // Creation is role-gated before the body is read.
                .service(
                    web::resource("/posts")
                        .route(web::get().to(posts::list))
                        .route(
                            web::post()
                                .to(posts::create)
                                .wrap(RequireRole::any_of(POST_AUTHORS)),
                        ),
                )
                .service(
                    web::resource("/posts/my")
                        .wrap(RequireRole::authenticated())
                        .route(web::get().to(posts::list_mine)),
                )
                .service(
                    web::resource("/posts/{id}")
                        .route(web::get().to(posts::get))
                        .route(web::put().to(posts::update))
                        .route(web::delete().to(posts::delete)),
                ),
        );
}

pub(crate) fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role.to_string(),
        is_active: user.is_active,
        created_at: user.created_at,
    }
}

pub(crate) fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        content: post.content,
        tags: post.tags,
        visibility: post.visibility.to_string(),
        post_type: post.post_type.to_string(),
        status: post.status.to_string(),
        media_urls: post.media_urls,
        scheduled_at: post.scheduled_at,
        published_at: post.published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub(crate) fn pagination<T>(page: &Page<T>) -> Pagination {
    Pagination {
        total: page.total,
        page: page.request.page,
        limit: page.request.limit,
        total_pages: page.total_pages(),
    }
}
