//! Authentication handlers.

use actix_web::{HttpResponse, web};

use tradeboard_core::services::{AuthService, Registration};
use tradeboard_shared::dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest, SessionUser};

use super::user_response;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/v1/auth/register
pub async fn register(state: web::Data<AppState>, body: web::Json<RegisterRequest>) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .auth
        .register(Registration {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role,
        })
        .await?;

    Ok(HttpResponse::Created().json(user_response(user)))
}

/// POST /api/v1/auth/login
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let session = state.auth.login(&req.email, &req.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        expires_in: AuthService::expires_in(&session),
        token: session.token.token,
        token_type: "Bearer".to_string(),
        user: SessionUser {
            id: session.user.id,
            role: session.user.role.to_string(),
        },
    }))
}

/// POST /api/v1/auth/logout
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new("Successfully logged out"))
}
