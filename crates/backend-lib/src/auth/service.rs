// ============================
// arbitrage-backend-lib/src/auth/service.rs
// ============================
//! Core decision logic for registration, login, and profile lookup.
//!
//! Orchestrates the credential store and the token issuer; carries no
//! transport concerns. Every expected failure surfaces as `None` so the API
//! boundary picks the status code, and the reason is recorded in logs only.
//! In particular the caller can never tell which field collided on
//! registration, nor a wrong password from an active lockout on login.

use std::sync::Arc;

use arbitrage_common::{AuthResponse, LoginRequest, RegisterRequest, UserInfoResponse};
use metrics::counter;
use tracing::{error, info, warn};

use crate::auth::store::{PasswordCheck, UserRecord, UserStore};
use crate::auth::token::TokenIssuer;

/// Role granted to every newly registered user
pub const DEFAULT_ROLE: &str = "User";

pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: Arc<TokenIssuer>) -> Self {
        Self { store, tokens }
    }

    /// Register a new user and issue a first token.
    ///
    /// Input shape (email format, username length, password strength,
    /// confirmation match) is the API boundary's job; uniqueness is
    /// re-checked here and enforced a final time by the store's create.
    pub async fn register(&self, request: &RegisterRequest) -> Option<AuthResponse> {
        match self.store.find_by_email(&request.email).await {
            Ok(Some(_)) => {
                warn!(email = %request.email, "registration rejected: email already in use");
                return None;
            },
            Ok(None) => {},
            Err(e) => {
                error!(error = %e, "store lookup failed during registration");
                return None;
            },
        }

        match self.store.find_by_username(&request.user_name).await {
            Ok(Some(_)) => {
                warn!(username = %request.user_name, "registration rejected: username already in use");
                return None;
            },
            Ok(None) => {},
            Err(e) => {
                error!(error = %e, "store lookup failed during registration");
                return None;
            },
        }

        // The store is the authoritative uniqueness gate; a duplicate create
        // that slipped past the pre-checks fails here, not as a crash.
        let user = match self
            .store
            .create_with_password(&request.email, &request.user_name, &request.password)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, email = %request.email, "user creation rejected");
                return None;
            },
        };

        if let Err(e) = self.store.add_to_role(&user.id, DEFAULT_ROLE).await {
            error!(error = %e, user_id = %user.id, "failed to assign default role");
            return None;
        }

        let response = self.issue_for(&user).await?;

        counter!("auth_registrations_total").increment(1);
        info!(email = %user.email, user_id = %user.id, "user registered");

        Some(response)
    }

    /// Authenticate by email and password and issue a token.
    pub async fn login(&self, request: &LoginRequest) -> Option<AuthResponse> {
        let user = match self.store.find_by_email(&request.email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(email = %request.email, "login rejected: unknown email");
                counter!("auth_login_failures_total").increment(1);
                return None;
            },
            Err(e) => {
                error!(error = %e, "store lookup failed during login");
                return None;
            },
        };

        match self
            .store
            .verify_password_with_lockout(&user.id, &request.password)
            .await
        {
            Ok(PasswordCheck::Verified) => {},
            Ok(PasswordCheck::Invalid) => {
                warn!(email = %request.email, "login rejected: wrong password");
                counter!("auth_login_failures_total").increment(1);
                return None;
            },
            Ok(PasswordCheck::LockedOut) => {
                warn!(email = %request.email, "login rejected: account locked");
                counter!("auth_lockout_rejections_total").increment(1);
                return None;
            },
            Err(e) => {
                error!(error = %e, "password verification failed");
                return None;
            },
        }

        let response = self.issue_for(&user).await?;

        counter!("auth_logins_total").increment(1);
        info!(email = %user.email, user_id = %user.id, "user logged in");

        Some(response)
    }

    /// Look up the profile behind a token subject. Read-only.
    pub async fn current_user(&self, user_id: &str) -> Option<UserInfoResponse> {
        let user = match self.store.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(e) => {
                error!(error = %e, user_id, "store lookup failed");
                return None;
            },
        };

        let roles = match self.store.get_roles(&user.id).await {
            Ok(roles) => roles,
            Err(e) => {
                error!(error = %e, user_id = %user.id, "role lookup failed");
                return None;
            },
        };

        Some(UserInfoResponse {
            user_id: user.id,
            email: user.email,
            user_name: user.username,
            roles,
            email_confirmed: user.email_confirmed,
        })
    }

    /// Fetch roles fresh and issue a token, so the embedded claims always
    /// reflect the store state at the moment of issuance.
    async fn issue_for(&self, user: &UserRecord) -> Option<AuthResponse> {
        let roles = match self.store.get_roles(&user.id).await {
            Ok(roles) => roles,
            Err(e) => {
                error!(error = %e, user_id = %user.id, "role lookup failed");
                return None;
            },
        };

        let issued = match self
            .tokens
            .issue(&user.id, &user.email, &user.username, &roles)
        {
            Ok(issued) => issued,
            Err(e) => {
                error!(error = %e, user_id = %user.id, "token issuance failed");
                return None;
            },
        };

        Some(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user_id: user.id.clone(),
            email: user.email.clone(),
            user_name: user.username.clone(),
            roles,
        })
    }
}
