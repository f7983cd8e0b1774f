// ============================
// arbitrage-backend-lib/src/lib.rs
// ============================
//! Core library for the arbitrage authentication backend.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod router;
pub mod seed;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, LockoutPolicy, MemoryUserStore, TokenIssuer, UserStore};
use crate::config::Settings;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Credential store; also the seeding target at startup
    pub store: Arc<dyn UserStore>,
    /// Authentication service
    pub auth: Arc<AuthService>,
    /// Token issuer/verifier, used by the bearer-token extractor
    pub tokens: Arc<TokenIssuer>,
    /// Settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state over an externally supplied store
    pub fn new(store: Arc<dyn UserStore>, settings: Settings) -> Self {
        let tokens = Arc::new(TokenIssuer::new(settings.jwt.clone()));
        let auth = Arc::new(AuthService::new(store.clone(), tokens.clone()));

        Self {
            store,
            auth,
            tokens,
            settings: Arc::new(settings),
        }
    }

    /// State backed by the in-memory store, for local runs and tests
    pub fn in_memory(settings: Settings) -> Self {
        let store = Arc::new(MemoryUserStore::new(
            LockoutPolicy::from(settings.lockout.clone()),
            settings.password_requirements.clone(),
        ));
        Self::new(store, settings)
    }
}
