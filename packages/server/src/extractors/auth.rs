use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. Missing or
/// invalid tokens reject the request with 401.
pub struct AuthUser {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl AuthUser {
    /// Returns `Ok(())` if the user is an admin, `Err(PermissionDenied)` otherwise.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// Returns `Ok(())` if the user is `target` or an admin.
    pub fn require_self_or_admin(&self, target: Uuid) -> Result<(), AppError> {
        if self.user_id == target || self.is_admin {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::TokenMissing)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::TokenInvalid)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id,
            is_admin: claims.is_admin,
        })
    }
}

/// Best-effort viewer identity for read endpoints.
///
/// Resolves the caller from the bearer token when one is present and
/// valid; anything else (no header, malformed value, bad signature,
/// expired token) yields an anonymous viewer. This extractor never
/// rejects, so feed reads work identically for logged-out users and
/// users holding stale tokens.
pub struct MaybeAuthUser(pub Option<Uuid>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let viewer = bearer_token(parts)
            .ok()
            .and_then(|token| jwt::verify(token, &state.config.auth.jwt_secret).ok())
            .and_then(|claims| Uuid::parse_str(&claims.sub).ok());

        Ok(MaybeAuthUser(viewer))
    }
}
