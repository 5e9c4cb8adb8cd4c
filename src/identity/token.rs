//! Stateless session tokens.
//! A token is a signed HS256 assertion of a user id with an expiry window.
//! Nothing is stored server-side; validity is reconstructible only from the
//! signature and the embedded timestamps.

use anyhow::{Result, anyhow};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub type SessionToken = String;

/// Default validity window: 7 days.
pub const DEFAULT_TTL_SECS: i64 = 7 * 24 * 3600;

/// Wire claims embedded in a session token. Timestamps are epoch seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token asserts.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates session tokens against a process-wide signing secret.
///
/// The secret is injected at construction so tests can run with distinct
/// secrets; there is no hidden global. An empty secret is rejected outright.
#[derive(Clone)]
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl SessionManager {
    pub fn new(secret: &str) -> Result<Self> {
        Self::with_ttl(secret, DEFAULT_TTL_SECS)
    }

    pub fn with_ttl(secret: &str, ttl_secs: i64) -> Result<Self> {
        if secret.trim().is_empty() {
            return Err(anyhow!("signing secret must not be empty"));
        }
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: no clock leeway.
        validation.leeway = 0;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        })
    }

    /// Mint a token asserting `user_id`, expiring at now + ttl.
    pub fn issue(&self, user_id: &str) -> Result<SessionToken> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Return the embedded user id for a well-formed, correctly signed,
    /// unexpired token. Every failure mode collapses to None; callers cannot
    /// distinguish a bad token from no token at all.
    pub fn validate(&self, token: &str) -> Option<String> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .ok()
            .map(|data| data.claims.sub)
    }
}
