//! Production [`AuthStore`] adapter backed by PostgreSQL.

use async_trait::async_trait;
use keygate_core::types::Timestamp;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::session::{CreateSession, Session};
use crate::models::user::User;
use crate::repositories::{SessionRepo, UserRepo};
use crate::store::AuthStore;

/// Thin adapter that scopes repository calls to a `sqlx` transaction.
///
/// An uncommitted [`Transaction`] rolls back when dropped, so a cancelled
/// request (client disconnect, timeout) aborts its in-flight writes
/// without any extra handling here.
#[derive(Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
        self.pool.begin().await
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), sqlx::Error> {
        tx.commit().await
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), sqlx::Error> {
        tx.rollback().await
    }

    async fn find_user_by_email(
        &self,
        tx: &mut Self::Tx,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        UserRepo::find_by_email(&mut **tx, email).await
    }

    async fn create_session(
        &self,
        tx: &mut Self::Tx,
        input: &CreateSession,
    ) -> Result<Session, sqlx::Error> {
        SessionRepo::create(&mut **tx, input).await
    }

    async fn get_session(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Session>, sqlx::Error> {
        SessionRepo::find_by_id(&mut **tx, id).await
    }

    async fn revoke_session(&self, tx: &mut Self::Tx, id: Uuid) -> Result<bool, sqlx::Error> {
        SessionRepo::revoke(&mut **tx, id).await
    }

    async fn delete_session(&self, tx: &mut Self::Tx, id: Uuid) -> Result<bool, sqlx::Error> {
        SessionRepo::delete(&mut **tx, id).await
    }

    async fn delete_expired_or_revoked(
        &self,
        tx: &mut Self::Tx,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        SessionRepo::delete_expired_or_revoked(&mut **tx, now).await
    }
}
