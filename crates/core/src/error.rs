//! Domain error taxonomy.
//!
//! `AuthError` carries the precise reason an authentication step failed.
//! The kinds exist for logging and tests; the HTTP layer collapses them
//! into generic client-facing messages so callers cannot probe why a
//! token was rejected.

/// Why an authentication step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or one that does not use the Bearer scheme.
    #[error("missing or invalid Authorization header")]
    MissingHeader,

    /// The token string could not be decoded as a signed token.
    #[error("malformed token")]
    MalformedToken,

    /// The signature does not verify under the configured secret and
    /// algorithm (including tokens whose header claims a different algorithm).
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's expiry time has passed.
    #[error("token expired")]
    Expired,

    /// The refresh token's session has been revoked.
    #[error("session is revoked")]
    SessionRevoked,

    /// The refresh token's subject does not match the stored session.
    #[error("refresh token does not match session")]
    SessionMismatch,

    /// Unknown email or wrong password at login. One kind for both so the
    /// response does not reveal which part was wrong.
    #[error("invalid email or password")]
    InvalidCredentials,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}
