// ============================
// arbitrage-backend-lib/src/middleware/mod.rs
// ============================
//! Middleware for the arbitrage API: bearer-token authentication.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::Claims;
use crate::error::AppError;
use crate::AppState;

/// Authenticated caller, extracted from the `Authorization: Bearer <token>`
/// header. Rejects with 401 when the header is missing or the token fails
/// any of the signature/issuer/audience/expiry checks.
pub struct AuthUser {
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::InvalidToken)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::InvalidToken)?;

        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::warn!(error = %e, "bearer token rejected");
            AppError::InvalidToken
        })?;

        Ok(AuthUser { claims })
    }
}
