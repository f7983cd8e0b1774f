// ============================
// arbitrage-backend-lib/tests/auth_flow_tests.rs
// ============================
//! End-to-end auth service flows against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};

use arbitrage_backend_lib::auth::{LockoutPolicy, MemoryUserStore, UserStore};
use arbitrage_backend_lib::config::Settings;
use arbitrage_backend_lib::{seed, AppState};
use arbitrage_common::{LoginRequest, RegisterRequest};

async fn test_state() -> AppState {
    let state = AppState::in_memory(Settings::default());
    seed::seed_roles(state.store.as_ref()).await.unwrap();
    state
}

/// State with a short lockout window so expiry can elapse inside a test
async fn test_state_with_lockout(max_failed_attempts: u32, lockout_millis: i64) -> AppState {
    let settings = Settings::default();
    let store = Arc::new(MemoryUserStore::new(
        LockoutPolicy {
            max_failed_attempts,
            lockout_duration: Duration::milliseconds(lockout_millis),
        },
        settings.password_requirements.clone(),
    ));
    let state = AppState::new(store, settings);
    seed::seed_roles(state.store.as_ref()).await.unwrap();
    state
}

fn register_request(email: &str, username: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        user_name: username.to_string(),
        password: password.to_string(),
        confirm_password: password.to_string(),
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn registration_issues_a_token_for_the_new_user() {
    let state = test_state().await;

    let response = state
        .auth
        .register(&register_request("a@x.com", "alice", "Abc12345!"))
        .await
        .expect("registration should succeed");

    assert_eq!(response.email, "a@x.com");
    assert_eq!(response.user_name, "alice");
    assert_eq!(response.roles, vec!["User"]);

    // The embedded subject is the freshly created user's id.
    let claims = state.tokens.verify(&response.token).unwrap();
    assert_eq!(claims.sub, response.user_id);
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.roles, vec!["User"]);

    let stored = state.store.find_by_id(&response.user_id).await.unwrap();
    assert!(stored.is_some());
    assert!(!stored.unwrap().email_confirmed);
}

#[tokio::test]
async fn duplicate_email_registration_fails_and_creates_no_user() {
    let state = test_state().await;

    state
        .auth
        .register(&register_request("a@x.com", "alice", "Abc12345!"))
        .await
        .expect("first registration should succeed");

    let second = state
        .auth
        .register(&register_request("a@x.com", "bob", "Abc12345!"))
        .await;
    assert!(second.is_none());

    // No record under the second username leaked in.
    assert!(state
        .store
        .find_by_username("bob")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn duplicate_username_registration_fails_uniformly() {
    let state = test_state().await;

    state
        .auth
        .register(&register_request("a@x.com", "alice", "Abc12345!"))
        .await
        .expect("first registration should succeed");

    let second = state
        .auth
        .register(&register_request("b@x.com", "alice", "Abc12345!"))
        .await;
    assert!(second.is_none());
    assert!(state.store.find_by_email("b@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn login_returns_a_token_with_the_configured_ttl() {
    let state = test_state().await;
    state
        .auth
        .register(&register_request("a@x.com", "alice", "Abc12345!"))
        .await
        .unwrap();

    let response = state
        .auth
        .login(&login_request("a@x.com", "Abc12345!"))
        .await
        .expect("login should succeed");

    let ttl = Duration::minutes(state.settings.jwt.expiration_minutes);
    let drift = response.expires_at - (Utc::now() + ttl);
    assert!(
        drift.num_seconds().abs() < 5,
        "expiry should be about now + TTL, drift was {drift}"
    );
}

#[tokio::test]
async fn successful_login_resets_the_failure_counter() {
    let state = test_state().await;
    let registered = state
        .auth
        .register(&register_request("a@x.com", "alice", "Abc12345!"))
        .await
        .unwrap();

    assert!(state
        .auth
        .login(&login_request("a@x.com", "wrong"))
        .await
        .is_none());
    assert_eq!(
        state
            .store
            .find_by_id(&registered.user_id)
            .await
            .unwrap()
            .unwrap()
            .failed_attempts,
        1
    );

    assert!(state
        .auth
        .login(&login_request("a@x.com", "Abc12345!"))
        .await
        .is_some());
    assert_eq!(
        state
            .store
            .find_by_id(&registered.user_id)
            .await
            .unwrap()
            .unwrap()
            .failed_attempts,
        0
    );
}

#[tokio::test]
async fn unknown_email_login_fails() {
    let state = test_state().await;
    assert!(state
        .auth
        .login(&login_request("nobody@x.com", "Abc12345!"))
        .await
        .is_none());
}

#[tokio::test]
async fn lockout_blocks_the_correct_password_until_it_expires() {
    let state = test_state_with_lockout(5, 300).await;

    state
        .auth
        .register(&register_request("a@x.com", "alice", "Abc12345!"))
        .await
        .unwrap();

    // Same email, different username: uniform failure.
    assert!(state
        .auth
        .register(&register_request("a@x.com", "alice2", "Abc12345!"))
        .await
        .is_none());

    for _ in 0..5 {
        assert!(state
            .auth
            .login(&login_request("a@x.com", "wrong"))
            .await
            .is_none());
    }

    // Sixth attempt with the correct password: still locked.
    assert!(state
        .auth
        .login(&login_request("a@x.com", "Abc12345!"))
        .await
        .is_none());

    tokio::time::sleep(std::time::Duration::from_millis(400)).await;

    let response = state
        .auth
        .login(&login_request("a@x.com", "Abc12345!"))
        .await
        .expect("login should succeed once the lockout has elapsed");
    assert_eq!(response.roles, vec!["User"]);
}

#[tokio::test]
async fn current_user_reports_the_stored_profile() {
    let state = test_state().await;
    let registered = state
        .auth
        .register(&register_request("a@x.com", "alice", "Abc12345!"))
        .await
        .unwrap();

    assert!(state.auth.current_user("no-such-id").await.is_none());

    // Membership added after registration shows up on the next read.
    state
        .store
        .add_to_role(&registered.user_id, "Admin")
        .await
        .unwrap();

    let info = state.auth.current_user(&registered.user_id).await.unwrap();
    assert_eq!(info.user_id, registered.user_id);
    assert_eq!(info.email, "a@x.com");
    assert_eq!(info.user_name, "alice");
    assert!(!info.email_confirmed);

    let mut roles = info.roles.clone();
    roles.sort();
    assert_eq!(roles, vec!["Admin", "User"]);
}
