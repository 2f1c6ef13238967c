//! HS256 token issuance and validation.
//!
//! Both access and refresh tokens are HS256-signed JWTs carrying a
//! [`Claims`] payload with a random `jti`. The refresh token's `jti` is
//! also the primary key of its session row, which is what ties the signed
//! token to the stored session state.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keygate_core::error::AuthError;
use keygate_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The user's internal database id.
    pub id: DbId,
    pub username: String,
    pub email: String,
    /// Subject -- the user's email, matched against the session row on renew.
    pub sub: String,
    /// Unique token identifier (UUID v4). For refresh tokens this is the
    /// session's primary key.
    pub jti: Uuid,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

impl Claims {
    /// Expiration as a UTC timestamp. `None` only for an out-of-range `exp`.
    pub fn expires_at(&self) -> Option<Timestamp> {
        chrono::DateTime::from_timestamp(self.exp, 0)
    }
}

/// Configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in hours (default: 24).
    pub refresh_token_expiry_hours: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in hours.
const DEFAULT_REFRESH_EXPIRY_HOURS: i64 = 24;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_HOURS` | no       | `24`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty. The process cannot
    /// serve requests without a signing key, so startup must not proceed.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_hours: i64 = std::env::var("JWT_REFRESH_EXPIRY_HOURS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_HOURS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_HOURS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_hours,
        }
    }

    pub fn access_token_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expiry_mins)
    }

    pub fn refresh_token_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.refresh_token_expiry_hours)
    }
}

/// Token issuer/validator holding the signing capability.
///
/// The keys are derived from the secret once, at construction, and never
/// change afterwards. Clones share nothing mutable.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // No leeway: a token is invalid the moment its exp passes.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Issue a signed token for the given user with the given lifetime.
    ///
    /// The claims carry a fresh UUID v4 `jti`, and `exp - iat` equals
    /// `duration` exactly.
    pub fn issue(
        &self,
        id: DbId,
        username: &str,
        email: &str,
        duration: chrono::Duration,
    ) -> Result<(String, Claims), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            id,
            username: username.to_string(),
            email: email.to_string(),
            sub: email.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + duration).timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok((token, claims))
    }

    /// Validate a token string and return the embedded [`Claims`].
    ///
    /// Only HS256 under the configured secret is accepted; a token whose
    /// header claims any other algorithm is rejected no matter what its
    /// payload says. Expiry is checked with zero leeway. Failures map to
    /// the specific [`AuthError`] kind so callers and tests can tell them
    /// apart; the HTTP layer collapses them before anything reaches the
    /// client.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }
}
