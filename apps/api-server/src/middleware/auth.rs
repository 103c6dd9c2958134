//! Authentication extractors.
//!
//! The bearer token is verified once per request: `RequireRole` stores the
//! resulting `Identity` in the request extensions and the extractors reuse it.

use std::future::{Ready, ready};

use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};

use tradeboard_core::Principal;
use tradeboard_core::ports::AuthError;
use tradeboard_shared::ErrorResponse;

use crate::state::AppState;

/// Authenticated requester.
///
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, user {}!", identity.principal().user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity(pub Principal);

impl Identity {
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AuthError::Expired
            | AuthError::InvalidSignature
            | AuthError::Malformed(_)
            | AuthError::MissingAuth
            | AuthError::InvalidHeader(_) => StatusCode::UNAUTHORIZED,
            AuthError::HashingError(_) | AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match &self.0 {
            AuthError::Expired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidSignature | AuthError::Malformed(_) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(self.0.to_string())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::InvalidHeader(msg) => ErrorResponse::new(401, "Authentication Required").with_detail(msg.clone()),
            AuthError::HashingError(_) | AuthError::Signing(_) => {
                tracing::error!(error = %self.0, "Authentication backend failure");
                ErrorResponse::internal_error()
            }
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

/// Verify the bearer token of `req`, reusing an identity bound earlier in the
/// pipeline.
pub fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    if let Some(identity) = req.extensions().get::<Identity>() {
        return Ok(identity.clone());
    }

    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::Malformed("server configuration error".to_string()));
    };

    let value = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::MissingAuth)?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Authorization header is not valid text".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidHeader("Expected Bearer token".to_string()))?;

    let claims = state.tokens.verify(token.trim())?;
    Ok(Identity(Principal::from(claims)))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|e| {
            tracing::debug!(error = %e, path = %req.path(), "Authentication failed");
            AuthenticationError(e)
        }))
    }
}

/// Identity for routes that serve anonymous readers too.
///
/// A missing header yields `None`. A header that is present but invalid is
/// still rejected, so a stale token never silently downgrades to anonymous.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref().map(Identity::principal)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match authenticate(req) {
            Ok(identity) => ready(Ok(OptionalIdentity(Some(identity)))),
            Err(AuthError::MissingAuth) => ready(Ok(OptionalIdentity(None))),
            Err(e) => ready(Err(AuthenticationError(e))),
        }
    }
}
