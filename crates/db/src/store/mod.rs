//! Storage capability trait for the session lifecycle.
//!
//! The lifecycle service is written against [`AuthStore`] rather than a
//! concrete database so the session state machine can be tested without
//! Postgres. Every data operation takes a transaction handle obtained from
//! [`AuthStore::begin`]; the caller decides when to commit or roll back,
//! which is what makes each multi-step operation atomic.

use async_trait::async_trait;
use keygate_core::types::Timestamp;
use uuid::Uuid;

use crate::models::session::{CreateSession, Session};
use crate::models::user::User;

mod memory;
mod postgres;

pub use memory::MemoryAuthStore;
pub use postgres::PgAuthStore;

#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Transaction handle scoping a group of operations. Dropping it
    /// without committing discards any writes.
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error>;
    async fn commit(&self, tx: Self::Tx) -> Result<(), sqlx::Error>;
    async fn rollback(&self, tx: Self::Tx) -> Result<(), sqlx::Error>;

    async fn find_user_by_email(
        &self,
        tx: &mut Self::Tx,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn create_session(
        &self,
        tx: &mut Self::Tx,
        input: &CreateSession,
    ) -> Result<Session, sqlx::Error>;

    async fn get_session(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Session>, sqlx::Error>;

    /// Mark a session revoked. Idempotent.
    async fn revoke_session(&self, tx: &mut Self::Tx, id: Uuid) -> Result<bool, sqlx::Error>;

    /// Delete a single session. Idempotent.
    async fn delete_session(&self, tx: &mut Self::Tx, id: Uuid) -> Result<bool, sqlx::Error>;

    /// Delete every session expired as of `now` or revoked; returns the
    /// deleted count.
    async fn delete_expired_or_revoked(
        &self,
        tx: &mut Self::Tx,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error>;
}
