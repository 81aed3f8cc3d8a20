//! Gateway-asserted caller identity.
//!
//! Authentication happens upstream (API gateway / auth proxy). The gateway
//! asserts the caller through trusted headers; this module lifts those headers
//! into a request extension and exposes an extractor for handlers that need a
//! caller identity.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// Header carrying the caller's user id (UUID), set by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's display name, set by the gateway.
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Identity of the caller as asserted by the upstream gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthenticatedUser>().cloned().ok_or_else(|| {
            AppError::Unauthorized("Missing caller identity".to_string()).into_response()
        })
    }
}

/// Middleware that lifts gateway identity headers into an [`AuthenticatedUser`]
/// extension.
///
/// Requests without (valid) identity headers pass through unchanged; handlers
/// that extract [`AuthenticatedUser`] then answer 401.
pub async fn gateway_identity(mut request: Request, next: Next) -> Response {
    if let Some(user) = identity_from_headers(request.headers()) {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

fn identity_from_headers(headers: &HeaderMap) -> Option<AuthenticatedUser> {
    let id = headers.get(USER_ID_HEADER)?.to_str().ok()?;
    let id = Uuid::parse_str(id).ok()?;
    let name = headers.get(USER_NAME_HEADER)?.to_str().ok()?.to_string();

    Some(AuthenticatedUser { id, name })
}
