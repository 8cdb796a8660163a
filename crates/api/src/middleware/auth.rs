//! JWT-based authentication extractor for Axum handlers.

use aistudio_core::error::CoreError;
use aistudio_core::types::DbId;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Body of every authentication rejection. Callers learn nothing about
/// which check failed.
const UNAUTHORIZED: &str = "Unauthorized";

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!(path = %parts.uri.path(), "Missing Authorization header");
                unauthorized()
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            tracing::warn!(path = %parts.uri.path(), "Malformed Authorization header");
            unauthorized()
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|e| {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Rejected access token");
            unauthorized()
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

fn unauthorized() -> AppError {
    AppError::Core(CoreError::Unauthorized(UNAUTHORIZED.into()))
}
