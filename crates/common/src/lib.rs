// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! shared between the arbitrage API and its clients.
//! This module defines the auth request/response bodies exactly as they
//! travel on the wire (camelCase field names, RFC 3339 timestamps).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/register`
/// # Fields
/// * `email` - Unique email address (case-insensitive)
/// * `user_name` - Unique display name, 3 to 50 characters
/// * `password` - Plaintext password, checked against the server's policy
/// * `confirm_password` - Must match `password` exactly
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub user_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Body of `POST /api/auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful register/login response: the bearer token plus the identity
/// it was issued for. Built fresh per request, never persisted.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Signed bearer token for `Authorization: Bearer <token>`
    pub token: String,
    /// Instant the token stops being valid
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub email: String,
    pub user_name: String,
    pub roles: Vec<String>,
}

/// Response of `GET /api/auth/me`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    pub user_id: String,
    pub email: String,
    pub user_name: String,
    pub roles: Vec<String>,
    pub email_confirmed: bool,
}
