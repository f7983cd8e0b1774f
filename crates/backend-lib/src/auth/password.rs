// ============================
// arbitrage-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use crate::config::PasswordRequirements;
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Scrypt,
};
use zeroize::Zeroize;

/// Hash a password using scrypt
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt.hash_password(plain.as_bytes(), &salt)?.to_string();
    Ok(hash)
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.len() < requirements.min_length {
        return false;
    }

    let checks = [
        (requirements.require_uppercase, password.chars().any(char::is_uppercase)),
        (requirements.require_lowercase, password.chars().any(char::is_lowercase)),
        (requirements.require_digit, password.chars().any(|c| c.is_ascii_digit())),
        (requirements.require_special, password.chars().any(|c| !c.is_alphanumeric())),
    ];

    checks.iter().all(|(required, present)| !required || *present)
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String) -> anyhow::Result<String> {
    let hash = hash_password(plain)?;
    plain.zeroize();
    Ok(hash)
}
