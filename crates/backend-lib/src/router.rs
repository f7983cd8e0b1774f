// ============================
// arbitrage-backend-lib/src/router.rs
// ============================
//! HTTP router and auth handlers.
//!
//! Thin translation layer: validate the body, call the auth service, map an
//! absent result to the uniform failure status for that operation.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use arbitrage_common::{LoginRequest, RegisterRequest};

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::validation;
use crate::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `POST /api/auth/register` — 200 with an `AuthResponse`, or 400 with a
/// generic message on any validation or uniqueness failure
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_register_request(&request, &state.settings.password_requirements)?;

    match state.auth.register(&request).await {
        Some(response) => Ok(Json(response)),
        None => Err(AppError::RegistrationFailed),
    }
}

/// `POST /api/auth/login` — 200 with an `AuthResponse`, or 401 with a
/// generic message on any failure (bad credentials or lockout)
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validation::validate_login_request(&request)?;

    match state.auth.login(&request).await {
        Some(response) => Ok(Json(response)),
        None => Err(AppError::AuthenticationFailed),
    }
}

/// `GET /api/auth/me` — requires a valid bearer token; 404 if the subject
/// no longer resolves to a user
async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    match state.auth.current_user(&user.claims.sub).await {
        Some(info) => Ok(Json(info)),
        None => Err(AppError::NotFound("user".to_string())),
    }
}
