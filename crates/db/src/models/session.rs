//! Refresh-token session model and DTOs.

use keygate_core::types::Timestamp;
use sqlx::FromRow;
use uuid::Uuid;

/// A session row from the `sessions` table.
///
/// `id` equals the `jti` claim of the refresh token the row was created
/// for. `is_revoked` is monotonic: once set it is never cleared; the row
/// lingers until a cleanup sweep deletes it.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_email: String,
    pub refresh_token: String,
    pub is_revoked: bool,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// DTO for creating a new session.
#[derive(Debug)]
pub struct CreateSession {
    pub id: Uuid,
    pub user_email: String,
    pub refresh_token: String,
    pub expires_at: Timestamp,
}
