// ============================
// arbitrage-backend-lib/src/auth/token.rs
// ============================
//! Signed bearer-token issuance and verification.
//!
//! Tokens are stateless, self-contained JWTs signed with a symmetric key
//! (HS256). The issuer keeps no record of what it has issued; revocation
//! before natural expiry is not supported. The `jti` claim gives every token
//! a unique identifier so a revocation list can be layered on later.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtSettings;

/// Claims embedded in every issued token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the user id
    pub sub: String,
    /// User email
    pub email: String,
    /// Username
    pub username: String,
    /// Unique token id
    pub jti: String,
    /// Role memberships at the moment of issuance
    pub roles: Vec<String>,
    /// Issuer identifier
    pub iss: String,
    /// Audience identifier
    pub aud: String,
    /// Issued-at timestamp (seconds since epoch)
    pub iat: i64,
    /// Expiry timestamp (seconds since epoch)
    pub exp: i64,
}

/// A freshly issued token together with its expiry instant
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies bearer tokens from a fixed signing configuration
pub struct TokenIssuer {
    settings: JwtSettings,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(settings: JwtSettings) -> Self {
        let encoding = EncodingKey::from_secret(settings.secret_key.as_bytes());
        let decoding = DecodingKey::from_secret(settings.secret_key.as_bytes());

        Self {
            settings,
            encoding,
            decoding,
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Duration {
        Duration::minutes(self.settings.expiration_minutes)
    }

    /// Issue a token for the given identity. Role claims must reflect the
    /// store state at the moment of issuance; callers fetch them fresh.
    pub fn issue(
        &self,
        user_id: &str,
        email: &str,
        username: &str,
        roles: &[String],
    ) -> anyhow::Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl();

        let claims = Claims {
            sub: user_id.to_owned(),
            email: email.to_owned(),
            username: username.to_owned(),
            jti: Uuid::new_v4().to_string(),
            roles: roles.to_vec(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate signature, issuer, audience, and expiry, and return the
    /// claims. Zero clock-skew tolerance: a token is invalid starting
    /// exactly at its expiry instant.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.settings.issuer]);
        validation.set_audience(&[&self.settings.audience]);

        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}
