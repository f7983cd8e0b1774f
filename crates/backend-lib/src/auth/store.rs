// ============================
// arbitrage-backend-lib/src/auth/store.rs
// ============================
//! Credential store contract and the in-memory reference implementation.
//!
//! The store is the single source of truth for user records and the
//! serialization point for per-user state transitions (failed-attempt
//! counter, lockout). Its `create_with_password` is the authoritative
//! uniqueness gate: callers may pre-check, but a duplicate create must fail
//! here even if the pre-check passed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::password;
use crate::config::{LockoutSettings, PasswordRequirements};

/// A user record as exposed to callers. The password hash never leaves
/// the store.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    pub email_confirmed: bool,
    pub failed_attempts: u32,
    pub lockout_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Store-level failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,

    #[error("username already in use")]
    DuplicateUsername,

    #[error("password does not meet the configured policy")]
    PasswordPolicy,

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Outcome of a password check with lockout bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// Password correct; failure counter reset
    Verified,
    /// Password wrong; failure counter advanced, lockout possibly started
    Invalid,
    /// Account currently locked; no verification performed
    LockedOut,
}

/// Lockout policy evaluated per user
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration: Duration::minutes(5),
        }
    }
}

impl From<LockoutSettings> for LockoutPolicy {
    fn from(settings: LockoutSettings) -> Self {
        Self {
            max_failed_attempts: settings.max_failed_attempts,
            lockout_duration: Duration::seconds(settings.duration_secs as i64),
        }
    }
}

/// Capability interface over the identity store.
///
/// Kept narrow so the auth service can be tested against an in-memory fake
/// implementing the same contract.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Create a user with a freshly hashed password, email unconfirmed.
    /// Enforces email/username uniqueness and the store's password policy.
    async fn create_with_password(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, StoreError>;

    /// Verify a password with lockout bookkeeping: a locked account is
    /// reported without verification, a success resets the failure counter,
    /// a failure advances it and starts a lockout at the threshold.
    async fn verify_password_with_lockout(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<PasswordCheck, StoreError>;

    async fn get_roles(&self, user_id: &str) -> Result<Vec<String>, StoreError>;

    /// Add the user to an already-provisioned role. Idempotent.
    async fn add_to_role(&self, user_id: &str, role: &str) -> Result<(), StoreError>;

    /// Provision a role name. Bootstrap only; roles are not created through
    /// the public API surface.
    async fn ensure_role(&self, role: &str) -> Result<(), StoreError>;

    /// Flip the email-confirmed flag. Used by bootstrap seeding; the
    /// confirmation flow itself lives outside this backend.
    async fn set_email_confirmed(&self, user_id: &str, confirmed: bool) -> Result<(), StoreError>;
}

struct StoredUser {
    record: UserRecord,
    password_hash: String,
}

#[derive(Default)]
struct Inner {
    /// id -> user
    users: HashMap<String, StoredUser>,
    /// normalized email -> id
    by_email: HashMap<String, String>,
    /// normalized username -> id
    by_username: HashMap<String, String>,
    /// provisioned role names
    roles: HashSet<String>,
    /// user id -> role names
    memberships: HashMap<String, HashSet<String>>,
}

/// In-memory reference implementation of [`UserStore`].
///
/// Single-instance only; all per-user transitions serialize on the one
/// write lock, which is what makes the uniqueness check race-free.
#[derive(Clone)]
pub struct MemoryUserStore {
    policy: LockoutPolicy,
    password_policy: PasswordRequirements,
    inner: Arc<RwLock<Inner>>,
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

impl MemoryUserStore {
    pub fn new(policy: LockoutPolicy, password_policy: PasswordRequirements) -> Self {
        Self {
            policy,
            password_policy,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(&normalize(email))
            .and_then(|id| inner.users.get(id))
            .map(|user| user.record.clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(id).map(|user| user.record.clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_username
            .get(&normalize(username))
            .and_then(|id| inner.users.get(id))
            .map(|user| user.record.clone()))
    }

    async fn create_with_password(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, StoreError> {
        if !password::validate_password_strength(password, &self.password_policy) {
            return Err(StoreError::PasswordPolicy);
        }

        // Hash outside the lock; scrypt is deliberately slow.
        let password_hash =
            password::hash_password(password).map_err(|e| StoreError::Hash(e.to_string()))?;

        let email_key = normalize(email);
        let username_key = normalize(username);

        let mut inner = self.inner.write().await;

        if inner.by_email.contains_key(&email_key) {
            return Err(StoreError::DuplicateEmail);
        }
        if inner.by_username.contains_key(&username_key) {
            return Err(StoreError::DuplicateUsername);
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: email.to_owned(),
            username: username.to_owned(),
            email_confirmed: false,
            failed_attempts: 0,
            lockout_until: None,
            created_at: Utc::now(),
        };

        inner.by_email.insert(email_key, record.id.clone());
        inner.by_username.insert(username_key, record.id.clone());
        inner.memberships.insert(record.id.clone(), HashSet::new());
        inner.users.insert(
            record.id.clone(),
            StoredUser {
                record: record.clone(),
                password_hash,
            },
        );

        Ok(record)
    }

    async fn verify_password_with_lockout(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<PasswordCheck, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::UnknownUser(user_id.to_owned()))?;

        let now = Utc::now();
        if let Some(until) = user.record.lockout_until {
            // Locked -> Active is a time-gated predicate, not a stored flip.
            if now < until {
                return Ok(PasswordCheck::LockedOut);
            }
        }

        if password::verify_password(&user.password_hash, password) {
            user.record.failed_attempts = 0;
            user.record.lockout_until = None;
            Ok(PasswordCheck::Verified)
        } else {
            user.record.failed_attempts += 1;
            if user.record.failed_attempts >= self.policy.max_failed_attempts {
                user.record.lockout_until = Some(now + self.policy.lockout_duration);
            }
            Ok(PasswordCheck::Invalid)
        }
    }

    async fn get_roles(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        if !inner.users.contains_key(user_id) {
            return Err(StoreError::UnknownUser(user_id.to_owned()));
        }

        let mut roles: Vec<String> = inner
            .memberships
            .get(user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        roles.sort();
        Ok(roles)
    }

    async fn add_to_role(&self, user_id: &str, role: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.roles.contains(role) {
            return Err(StoreError::UnknownRole(role.to_owned()));
        }
        if !inner.users.contains_key(user_id) {
            return Err(StoreError::UnknownUser(user_id.to_owned()));
        }

        inner
            .memberships
            .entry(user_id.to_owned())
            .or_default()
            .insert(role.to_owned());
        Ok(())
    }

    async fn ensure_role(&self, role: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.roles.insert(role.to_owned());
        Ok(())
    }

    async fn set_email_confirmed(&self, user_id: &str, confirmed: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::UnknownUser(user_id.to_owned()))?;
        user.record.email_confirmed = confirmed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryUserStore {
        MemoryUserStore::new(LockoutPolicy::default(), PasswordRequirements::default())
    }

    fn store_with_lockout(max_failed_attempts: u32, lockout_duration: Duration) -> MemoryUserStore {
        MemoryUserStore::new(
            LockoutPolicy {
                max_failed_attempts,
                lockout_duration,
            },
            PasswordRequirements::default(),
        )
    }

    #[tokio::test]
    async fn create_and_find_back() {
        let store = store();
        let created = store
            .create_with_password("a@x.com", "alice", "Abc12345!")
            .await
            .unwrap();

        assert!(!created.email_confirmed);
        assert_eq!(created.failed_attempts, 0);
        assert!(created.lockout_until.is_none());

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_username = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_username.email, "a@x.com");
    }

    #[tokio::test]
    async fn uniqueness_is_case_insensitive() {
        let store = store();
        store
            .create_with_password("a@x.com", "alice", "Abc12345!")
            .await
            .unwrap();

        let err = store
            .create_with_password("A@X.COM", "bob", "Abc12345!")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        let err = store
            .create_with_password("b@x.com", "ALICE", "Abc12345!")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername));

        // The failed creates left nothing behind.
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
        assert!(store.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn weak_passwords_are_rejected_by_the_store() {
        let store = store();
        let err = store
            .create_with_password("a@x.com", "alice", "weak")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PasswordPolicy));
    }

    #[tokio::test]
    async fn verify_resets_counter_on_success() {
        let store = store();
        let user = store
            .create_with_password("a@x.com", "alice", "Abc12345!")
            .await
            .unwrap();

        assert_eq!(
            store
                .verify_password_with_lockout(&user.id, "wrong")
                .await
                .unwrap(),
            PasswordCheck::Invalid
        );
        assert_eq!(
            store.find_by_id(&user.id).await.unwrap().unwrap().failed_attempts,
            1
        );

        assert_eq!(
            store
                .verify_password_with_lockout(&user.id, "Abc12345!")
                .await
                .unwrap(),
            PasswordCheck::Verified
        );
        let record = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(record.failed_attempts, 0);
        assert!(record.lockout_until.is_none());
    }

    #[tokio::test]
    async fn reaching_the_threshold_locks_the_account() {
        let store = store_with_lockout(3, Duration::minutes(5));
        let user = store
            .create_with_password("a@x.com", "alice", "Abc12345!")
            .await
            .unwrap();

        for _ in 0..3 {
            assert_eq!(
                store
                    .verify_password_with_lockout(&user.id, "wrong")
                    .await
                    .unwrap(),
                PasswordCheck::Invalid
            );
        }

        let record = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(record.lockout_until.is_some());

        // Correct password while locked is still reported as locked.
        assert_eq!(
            store
                .verify_password_with_lockout(&user.id, "Abc12345!")
                .await
                .unwrap(),
            PasswordCheck::LockedOut
        );
    }

    #[tokio::test]
    async fn lockout_expires_by_time_alone() {
        let store = store_with_lockout(1, Duration::milliseconds(50));
        let user = store
            .create_with_password("a@x.com", "alice", "Abc12345!")
            .await
            .unwrap();

        store
            .verify_password_with_lockout(&user.id, "wrong")
            .await
            .unwrap();
        assert_eq!(
            store
                .verify_password_with_lockout(&user.id, "Abc12345!")
                .await
                .unwrap(),
            PasswordCheck::LockedOut
        );

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        assert_eq!(
            store
                .verify_password_with_lockout(&user.id, "Abc12345!")
                .await
                .unwrap(),
            PasswordCheck::Verified
        );
    }

    #[tokio::test]
    async fn roles_must_be_provisioned_before_assignment() {
        let store = store();
        let user = store
            .create_with_password("a@x.com", "alice", "Abc12345!")
            .await
            .unwrap();

        let err = store.add_to_role(&user.id, "User").await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownRole(_)));

        store.ensure_role("User").await.unwrap();
        store.add_to_role(&user.id, "User").await.unwrap();
        store.add_to_role(&user.id, "User").await.unwrap(); // idempotent

        assert_eq!(store.get_roles(&user.id).await.unwrap(), vec!["User"]);
    }

    #[tokio::test]
    async fn unknown_users_are_reported() {
        let store = store();
        assert!(store.find_by_id("nope").await.unwrap().is_none());
        assert!(matches!(
            store.get_roles("nope").await.unwrap_err(),
            StoreError::UnknownUser(_)
        ));
        assert!(matches!(
            store
                .verify_password_with_lockout("nope", "x")
                .await
                .unwrap_err(),
            StoreError::UnknownUser(_)
        ));
    }
}
