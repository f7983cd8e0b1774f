// ============================
// arbitrage-backend-lib/src/seed.rs
// ============================
//! Process bootstrap data: the fixed role set and development accounts.

use tracing::{info, warn};

use crate::auth::{StoreError, UserStore};

/// Roles provisioned at startup. Role membership is the only authorization
/// input tokens carry, so the set is fixed here rather than managed through
/// the API.
pub const ROLES: [&str; 3] = ["Admin", "User", "Moderator"];

/// Seed roles and development accounts. Role provisioning failures abort
/// startup; account seeding is best-effort.
pub async fn seed(store: &dyn UserStore) -> Result<(), StoreError> {
    seed_roles(store).await?;
    seed_users(store).await;
    Ok(())
}

/// Provision the role set. Idempotent.
pub async fn seed_roles(store: &dyn UserStore) -> Result<(), StoreError> {
    for role in ROLES {
        store.ensure_role(role).await?;
    }
    Ok(())
}

/// Development convenience accounts. Skipped when already present.
pub async fn seed_users(store: &dyn UserStore) {
    seed_user(store, "admin@example.com", "admin", "Admin@123", "Admin").await;
    seed_user(store, "user@example.com", "user", "User@123", "User").await;
}

async fn seed_user(store: &dyn UserStore, email: &str, username: &str, password: &str, role: &str) {
    match store.find_by_email(email).await {
        Ok(Some(_)) => return,
        Ok(None) => {},
        Err(e) => {
            warn!(error = %e, email, "seed lookup failed");
            return;
        },
    }

    match store.create_with_password(email, username, password).await {
        Ok(user) => {
            if let Err(e) = store.set_email_confirmed(&user.id, true).await {
                warn!(error = %e, email, "could not confirm seeded account");
            }
            if let Err(e) = store.add_to_role(&user.id, role).await {
                warn!(error = %e, email, role, "could not assign seeded role");
            }
            info!(email, role, "seeded account");
        },
        Err(e) => warn!(error = %e, email, "seed account not created"),
    }
}
