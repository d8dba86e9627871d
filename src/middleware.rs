use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::database::AppState;
use crate::error::ApiError;

/// Header carrying the identity of the calling principal
pub const OWNER_HEADER: &str = "x-owner-id";

/// Middleware to check for Authorization header
///
/// When an API secret is configured, the request must carry an
/// `Authorization` header with exactly that value. Without a configured
/// secret the check is skipped.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(secret) = &state.config.auth_secret {
        let provided = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok());

        if provided != Some(secret.as_str()) {
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// Opaque identifier of the principal making the request
///
/// Supplied by the identity layer in front of the service through the
/// `X-Owner-Id` header. The value is not interpreted, only compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Owner(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}
