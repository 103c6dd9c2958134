use actix_web::{HttpResponse, web};

use super::user_response;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/users/profile
pub async fn profile(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.users.profile(identity.principal()).await?;
    Ok(HttpResponse::Ok().json(user_response(user)))
}
