//! Role gate: authenticate the bearer token, then check the bound role
//! against a route's allow-list.

use std::future::{Future, Ready, ready};
use std::pin::Pin;

use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};

use tradeboard_core::access::authorize;

use super::auth::{AuthenticationError, authenticate};
use super::error::AppError;

/// Middleware factory guarding a scope or resource.
///
/// ```ignore
/// web::scope("/admin").wrap(RequireRole::any_of(ADMIN_ONLY))
/// ```
#[derive(Clone, Copy)]
pub struct RequireRole {
    allowed: &'static [&'static str],
}

impl RequireRole {
    pub fn any_of(allowed: &'static [&'static str]) -> Self {
        Self { allowed }
    }

    /// Any authenticated principal.
    pub fn authenticated() -> Self {
        Self { allowed: &[] }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            allowed: self.allowed,
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    allowed: &'static [&'static str],
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let identity = match authenticate(req.request()) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::debug!(error = %e, path = %req.path(), "Authentication failed");
                let res = req.error_response(AuthenticationError(e));
                return Box::pin(async move { Ok(res.map_into_right_body()) });
            }
        };

        if let Err(e) = authorize(identity.principal(), self.allowed) {
            tracing::warn!(
                user_id = %identity.principal().user_id,
                path = %req.path(),
                error = %e,
                "Role not allowed"
            );
            let res = req.error_response(AppError::Forbidden(e.to_string()));
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        req.extensions_mut().insert(identity);
        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
