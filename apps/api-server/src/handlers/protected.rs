use actix_web::HttpResponse;

use tradeboard_shared::dto::ProtectedResponse;

use crate::middleware::auth::Identity;

/// GET /api/v1/protected
pub async fn protected(identity: Identity) -> HttpResponse {
    let principal = identity.principal();
    HttpResponse::Ok().json(ProtectedResponse {
        message: "Access granted".to_string(),
        user_id: principal.user_id,
        role: principal.role.to_string(),
    })
}
