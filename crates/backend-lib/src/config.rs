// ============================
// arbitrage-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// Token signing settings
    pub jwt: JwtSettings,
    /// Password complexity requirements
    pub password_requirements: PasswordRequirements,
    /// Account lockout settings
    pub lockout: LockoutSettings,
}

/// Token signing settings.
///
/// The defaults keep the server operable with no configuration at all; they
/// are for local development only and must be overridden in any deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    /// Symmetric signing secret shared with verifiers, at least 32 bytes
    pub secret_key: String,
    /// Issuer identifier embedded in every token
    pub issuer: String,
    /// Audience identifier embedded in every token
    pub audience: String,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
}

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// Require uppercase letters
    pub require_uppercase: bool,
    /// Require lowercase letters
    pub require_lowercase: bool,
    /// Require digits
    pub require_digit: bool,
    /// Require special characters
    pub require_special: bool,
}

/// Account lockout settings, evaluated per user by the credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutSettings {
    /// Failed attempts before the account locks
    pub max_failed_attempts: u32,
    /// How long a lockout lasts, in seconds
    pub duration_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            log_level: "info".to_string(),
            jwt: JwtSettings::default(),
            password_requirements: PasswordRequirements::default(),
            lockout: LockoutSettings::default(),
        }
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            // Local-development fallback only; never deploy with this value.
            secret_key: "local-dev-signing-secret-change-before-deploy-0123456789!".to_string(),
            issuer: "arbitrage-api".to_string(),
            audience: "arbitrage-client".to_string(),
            expiration_minutes: 60,
        }
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl Default for LockoutSettings {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            duration_secs: 5 * 60,
        }
    }
}

impl Settings {
    /// Load settings from the default file location and environment
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings, merging defaults, a TOML file, and `ARBITRAGE_*`
    /// environment variables (nested keys split on `__`)
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ARBITRAGE_").split("__"))
            .extract()?;

        Ok(settings)
    }
}
