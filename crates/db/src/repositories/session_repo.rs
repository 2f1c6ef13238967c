//! Repository for the `sessions` table.

use keygate_core::types::Timestamp;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::session::{CreateSession, Session};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_email, refresh_token, is_revoked, created_at, expires_at";

/// Provides CRUD operations for refresh-token sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create<'e>(
        db: impl PgExecutor<'e>,
        input: &CreateSession,
    ) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (id, user_email, refresh_token, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.id)
            .bind(&input.user_email)
            .bind(&input.refresh_token)
            .bind(input.expires_at)
            .fetch_one(db)
            .await
    }

    /// Find a session by its id (the refresh token's jti claim).
    pub async fn find_by_id<'e>(
        db: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Mark a session revoked. Idempotent; returns `true` if the row
    /// transitioned on this call.
    pub async fn revoke<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE sessions SET is_revoked = true WHERE id = $1 AND is_revoked = false")
                .bind(id)
                .execute(db)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a single session. Idempotent; returns `true` if a row was
    /// deleted.
    pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session that is expired as of `now` or revoked.
    /// Returns the count of deleted rows.
    pub async fn delete_expired_or_revoked<'e>(
        db: impl PgExecutor<'e>,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE expires_at <= $1 OR is_revoked = true")
                .bind(now)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }
}
