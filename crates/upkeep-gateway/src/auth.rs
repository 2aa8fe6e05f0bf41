use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use tracing::warn;
use upkeep_users::Claims;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller, taken from `Authorization: Bearer <token>`.
///
/// Handlers that take this extractor reject anonymous requests with 401 and
/// bad or expired tokens with 403.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::new(StatusCode::UNAUTHORIZED, "Access denied. No token provided.")
            })?;

        state.tokens.verify(token).map(AuthUser).map_err(|e| {
            warn!(path = %parts.uri.path(), "rejected bearer token: {e}");
            ApiError::new(StatusCode::FORBIDDEN, "Invalid or expired token.")
        })
    }
}
