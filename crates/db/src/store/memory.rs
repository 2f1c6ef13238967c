//! In-memory [`AuthStore`] adapter.
//!
//! Test double for the session state machine: unit tests in the API crate
//! run the full lifecycle (login, renew, revoke, cleanup) against this
//! store instead of Postgres. Transactions are modeled as a snapshot of
//! the shared state; commit publishes the snapshot, rollback (or drop)
//! discards it, matching the visibility rules the lifecycle code relies
//! on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use keygate_core::types::Timestamp;
use uuid::Uuid;

use crate::models::session::{CreateSession, Session};
use crate::models::user::User;
use crate::store::AuthStore;

#[derive(Debug, Default, Clone)]
struct MemoryState {
    users: Vec<User>,
    sessions: HashMap<Uuid, Session>,
}

/// Snapshot transaction over [`MemoryAuthStore`].
pub struct MemoryTx {
    staged: MemoryState,
}

#[derive(Clone, Default)]
pub struct MemoryAuthStore {
    inner: Arc<Mutex<MemoryState>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user row (tests hash the password themselves).
    pub fn add_user(&self, user: User) {
        self.inner.lock().unwrap().users.push(user);
    }

    /// When set, every write operation fails with a connection error.
    /// Lets tests exercise the rollback paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of committed session rows.
    pub fn session_count(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    fn check_writable(&self) -> Result<(), sqlx::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl AuthStore for MemoryAuthStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
        let staged = self.inner.lock().unwrap().clone();
        Ok(MemoryTx { staged })
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), sqlx::Error> {
        *self.inner.lock().unwrap() = tx.staged;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), sqlx::Error> {
        drop(tx);
        Ok(())
    }

    async fn find_user_by_email(
        &self,
        tx: &mut Self::Tx,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        Ok(tx.staged.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_session(
        &self,
        tx: &mut Self::Tx,
        input: &CreateSession,
    ) -> Result<Session, sqlx::Error> {
        self.check_writable()?;
        let session = Session {
            id: input.id,
            user_email: input.user_email.clone(),
            refresh_token: input.refresh_token.clone(),
            is_revoked: false,
            created_at: Utc::now(),
            expires_at: input.expires_at,
        };
        tx.staged.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<Session>, sqlx::Error> {
        Ok(tx.staged.sessions.get(&id).cloned())
    }

    async fn revoke_session(&self, tx: &mut Self::Tx, id: Uuid) -> Result<bool, sqlx::Error> {
        self.check_writable()?;
        match tx.staged.sessions.get_mut(&id) {
            Some(session) if !session.is_revoked => {
                session.is_revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_session(&self, tx: &mut Self::Tx, id: Uuid) -> Result<bool, sqlx::Error> {
        self.check_writable()?;
        Ok(tx.staged.sessions.remove(&id).is_some())
    }

    async fn delete_expired_or_revoked(
        &self,
        tx: &mut Self::Tx,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        self.check_writable()?;
        let before = tx.staged.sessions.len();
        tx.staged
            .sessions
            .retain(|_, s| s.expires_at > now && !s.is_revoked);
        Ok((before - tx.staged.sessions.len()) as u64)
    }
}
