// ============================
// arbitrage-backend-lib/src/error.rs
// ============================
//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context.
///
/// Registration and login failures are deliberately uniform: the response
/// never names the colliding field and never distinguishes a wrong password
/// from an active lockout. The detail lives in logs only.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] crate::validation::ValidationError),

    #[error("Registration failed")]
    RegistrationFailed,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Missing or invalid bearer token")]
    InvalidToken,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::RegistrationFailed => StatusCode::BAD_REQUEST,
            AppError::AuthenticationFailed | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::RegistrationFailed => "REG_001",
            AppError::AuthenticationFailed => "AUTH_001",
            AppError::InvalidToken => "AUTH_002",
            AppError::NotFound(_) => "NF_001",
            AppError::Internal(_) => "INT_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            // Validation messages describe the caller's own input; safe to return.
            AppError::Validation(e) => e.to_string(),
            AppError::RegistrationFailed => {
                "Registration failed. The email or username may already be in use.".to_string()
            },
            AppError::AuthenticationFailed => {
                "Invalid email or password. Please try again.".to_string()
            },
            AppError::InvalidToken => "Authentication required".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            AppError::Json(_) => "Invalid request format".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
