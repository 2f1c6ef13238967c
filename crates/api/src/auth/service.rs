//! Session lifecycle service: login, renew, logout, revoke.
//!
//! Generic over [`AuthStore`] so the whole state machine runs against the
//! in-memory store in unit tests. Each operation opens one transaction;
//! any error rolls it back and is returned to the caller unchanged, so a
//! failed login can never leak tokens for a session that was not
//! persisted.

use keygate_core::error::{AuthError, CoreError};
use keygate_db::models::session::{CreateSession, Session};
use keygate_db::store::AuthStore;
use uuid::Uuid;

use crate::auth::jwt::{Claims, TokenService};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};

/// Everything a successful login produces.
#[derive(Debug)]
pub struct LoginOutcome {
    pub access_token: String,
    pub access_claims: Claims,
    pub refresh_token: String,
    pub refresh_claims: Claims,
    pub session: Session,
}

#[derive(Clone)]
pub struct AuthService<S> {
    store: S,
    tokens: TokenService,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl<S: AuthStore> AuthService<S> {
    pub fn new(
        store: S,
        tokens: TokenService,
        access_ttl: chrono::Duration,
        refresh_ttl: chrono::Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Authenticate credentials, issue an access + refresh token pair, and
    /// persist the refresh token's session row.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller. If the session row cannot be written the storage error is
    /// returned instead of the tokens.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let mut tx = self.store.begin().await?;
        let result = self.login_in_tx(&mut tx, email, password).await;
        self.finish(tx, result).await
    }

    async fn login_in_tx(
        &self,
        tx: &mut S::Tx,
        email: &str,
        password: &str,
    ) -> AppResult<LoginOutcome> {
        let user = self
            .store
            .find_user_by_email(tx, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_valid = verify_password(password, &user.password_hash)
            .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
        if !password_valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        let (access_token, access_claims) = self
            .tokens
            .issue(user.id, &user.username, &user.email, self.access_ttl)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

        let (refresh_token, refresh_claims) = self
            .tokens
            .issue(user.id, &user.username, &user.email, self.refresh_ttl)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

        let expires_at = refresh_claims
            .expires_at()
            .ok_or_else(|| AppError::InternalError("Refresh expiry out of range".to_string()))?;

        // The session's primary key is the refresh token's jti, and its
        // expiry is the refresh claims' expiry. Renew depends on both.
        let session = self
            .store
            .create_session(
                tx,
                &CreateSession {
                    id: refresh_claims.jti,
                    user_email: user.email.clone(),
                    refresh_token: refresh_token.clone(),
                    expires_at,
                },
            )
            .await?;

        Ok(LoginOutcome {
            access_token,
            access_claims,
            refresh_token,
            refresh_claims,
            session,
        })
    }

    /// Exchange a valid refresh token for a new access token.
    ///
    /// The refresh token must validate, its session must exist, must not
    /// be revoked, and must belong to the token's subject. The session row
    /// is only read; no rotation happens here.
    pub async fn renew_access_token(&self, refresh_token: &str) -> AppResult<(String, Claims)> {
        let refresh_claims = self
            .tokens
            .validate(refresh_token)
            .map_err(CoreError::Auth)?;

        let mut tx = self.store.begin().await?;
        let result = self.renew_in_tx(&mut tx, &refresh_claims).await;
        self.finish(tx, result).await
    }

    async fn renew_in_tx(
        &self,
        tx: &mut S::Tx,
        refresh_claims: &Claims,
    ) -> AppResult<(String, Claims)> {
        let session = self
            .store
            .get_session(tx, refresh_claims.jti)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "session",
                    id: refresh_claims.jti.to_string(),
                })
            })?;

        if session.is_revoked {
            return Err(AuthError::SessionRevoked.into());
        }

        if session.user_email != refresh_claims.sub {
            return Err(AuthError::SessionMismatch.into());
        }

        self.tokens
            .issue(
                refresh_claims.id,
                &refresh_claims.username,
                &refresh_claims.email,
                self.access_ttl,
            )
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
    }

    /// Hard-delete one session. Idempotent: deleting an absent id is fine.
    pub async fn logout(&self, session_id: Uuid) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let result = self
            .store
            .delete_session(&mut tx, session_id)
            .await
            .map(|_| ())
            .map_err(AppError::from);
        self.finish(tx, result).await
    }

    /// Soft-invalidate one session: sets the revoked flag, keeps the row
    /// until the next cleanup sweep. Idempotent.
    pub async fn revoke_session(&self, session_id: Uuid) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        let result = self
            .store
            .revoke_session(&mut tx, session_id)
            .await
            .map(|_| ())
            .map_err(AppError::from);
        self.finish(tx, result).await
    }

    /// Commit on success; roll back and re-raise the original error
    /// otherwise.
    async fn finish<T>(&self, tx: S::Tx, result: AppResult<T>) -> AppResult<T> {
        match result {
            Ok(value) => {
                self.store.commit(tx).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    tracing::warn!(error = %rollback_err, "Transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use crate::auth::password::hash_password;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use keygate_db::models::user::User;
    use keygate_db::store::MemoryAuthStore;

    fn test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_hours: 24,
        }
    }

    fn test_user(id: i64, username: &str, email: &str, password: &str) -> User {
        User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).expect("hashing should succeed"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Service over a fresh in-memory store, plus the store for direct
    /// inspection.
    fn test_service() -> (AuthService<MemoryAuthStore>, MemoryAuthStore) {
        let config = test_jwt_config();
        let store = MemoryAuthStore::new();
        let service = AuthService::new(
            store.clone(),
            TokenService::new(&config),
            config.access_token_duration(),
            config.refresh_token_duration(),
        );
        (service, store)
    }

    async fn login_alice(
        service: &AuthService<MemoryAuthStore>,
        store: &MemoryAuthStore,
    ) -> LoginOutcome {
        store.add_user(test_user(1, "alice", "alice@x.com", "pw"));
        service
            .login("alice@x.com", "pw")
            .await
            .expect("login should succeed")
    }

    // -----------------------------------------------------------------
    // Login
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_login_persists_session_bound_to_refresh_token() {
        let (service, store) = test_service();
        let outcome = login_alice(&service, &store).await;

        assert_eq!(outcome.session.id, outcome.refresh_claims.jti);
        assert_eq!(outcome.session.user_email, "alice@x.com");
        assert!(!outcome.session.is_revoked);
        assert_eq!(
            outcome.session.expires_at.timestamp(),
            outcome.refresh_claims.exp
        );
        assert_eq!(store.session_count(), 1);

        // Access and refresh lifetimes follow the configured policy.
        let access = &outcome.access_claims;
        let refresh = &outcome.refresh_claims;
        assert_eq!(access.exp - access.iat, 15 * 60);
        assert_eq!(refresh.exp - refresh.iat, 24 * 3600);
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_rejected() {
        let (service, store) = test_service();
        store.add_user(test_user(1, "alice", "alice@x.com", "pw"));

        let result = service.login("alice@x.com", "wrong").await;
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::Auth(AuthError::InvalidCredentials)))
        );
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_rejected() {
        let (service, _store) = test_service();
        let result = service.login("ghost@x.com", "pw").await;
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::Auth(AuthError::InvalidCredentials)))
        );
    }

    #[tokio::test]
    async fn test_login_storage_failure_returns_no_tokens() {
        let (service, store) = test_service();
        store.add_user(test_user(1, "alice", "alice@x.com", "pw"));
        store.set_fail_writes(true);

        let result = service.login("alice@x.com", "pw").await;
        assert_matches!(result, Err(AppError::Database(_)));
        assert_eq!(store.session_count(), 0, "nothing may be persisted");
    }

    // -----------------------------------------------------------------
    // Renew
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_renew_issues_fresh_access_token_and_leaves_session_alone() {
        let (service, store) = test_service();
        let outcome = login_alice(&service, &store).await;

        let (token, claims) = service
            .renew_access_token(&outcome.refresh_token)
            .await
            .expect("renew should succeed");

        assert!(!token.is_empty());
        assert_eq!(claims.sub, "alice@x.com");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert_ne!(claims.jti, outcome.refresh_claims.jti);

        // The session row is read-only for renew: same token, same flags,
        // and no new row appeared.
        let mut tx = store.begin().await.unwrap();
        let session = store
            .get_session(&mut tx, outcome.session.id)
            .await
            .unwrap()
            .expect("session must still exist");
        assert!(!session.is_revoked);
        assert_eq!(session.refresh_token, outcome.refresh_token);
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_renew_with_unknown_session_is_not_found() {
        let (service, store) = test_service();
        let outcome = login_alice(&service, &store).await;

        service.logout(outcome.session.id).await.unwrap();

        let result = service.renew_access_token(&outcome.refresh_token).await;
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::NotFound { entity: "session", .. }))
        );
    }

    #[tokio::test]
    async fn test_renew_after_revoke_fails_no_matter_how_often_revoked() {
        let (service, store) = test_service();
        let outcome = login_alice(&service, &store).await;

        service.revoke_session(outcome.session.id).await.unwrap();
        service.revoke_session(outcome.session.id).await.unwrap();

        let result = service.renew_access_token(&outcome.refresh_token).await;
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::Auth(AuthError::SessionRevoked)))
        );

        // The row itself is retained for the cleanup sweep.
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_renew_rejects_token_replayed_against_foreign_session() {
        let (service, store) = test_service();
        let tokens = TokenService::new(&test_jwt_config());

        // A validly signed refresh token whose session row belongs to a
        // different subject.
        let (refresh_token, claims) = tokens
            .issue(1, "alice", "alice@x.com", chrono::Duration::hours(24))
            .unwrap();
        let mut tx = store.begin().await.unwrap();
        store
            .create_session(
                &mut tx,
                &CreateSession {
                    id: claims.jti,
                    user_email: "bob@x.com".to_string(),
                    refresh_token: refresh_token.clone(),
                    expires_at: claims.expires_at().unwrap(),
                },
            )
            .await
            .unwrap();
        store.commit(tx).await.unwrap();

        let result = service.renew_access_token(&refresh_token).await;
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::Auth(AuthError::SessionMismatch)))
        );
    }

    #[tokio::test]
    async fn test_renew_with_expired_refresh_token_fails_before_lookup() {
        let config = test_jwt_config();
        let store = MemoryAuthStore::new();
        // Refresh tokens that are born expired.
        let service = AuthService::new(
            store.clone(),
            TokenService::new(&config),
            config.access_token_duration(),
            chrono::Duration::seconds(-1),
        );
        store.add_user(test_user(1, "alice", "alice@x.com", "pw"));
        let outcome = service.login("alice@x.com", "pw").await.unwrap();

        let result = service.renew_access_token(&outcome.refresh_token).await;
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::Auth(AuthError::Expired)))
        );
    }

    #[tokio::test]
    async fn test_renew_with_garbage_token_is_malformed() {
        let (service, _store) = test_service();
        let result = service.renew_access_token("not-a-token").await;
        assert_matches!(
            result,
            Err(AppError::Core(CoreError::Auth(AuthError::MalformedToken)))
        );
    }

    // -----------------------------------------------------------------
    // Logout / revoke
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_logout_deletes_and_is_idempotent() {
        let (service, store) = test_service();
        let outcome = login_alice(&service, &store).await;

        service.logout(outcome.session.id).await.unwrap();
        assert_eq!(store.session_count(), 0);

        // Deleting an already-absent session is not an error.
        service.logout(outcome.session.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent_and_keeps_the_row() {
        let (service, store) = test_service();
        let outcome = login_alice(&service, &store).await;

        service.revoke_session(outcome.session.id).await.unwrap();
        service.revoke_session(outcome.session.id).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let session = store
            .get_session(&mut tx, outcome.session.id)
            .await
            .unwrap()
            .expect("revoked session must still exist");
        assert!(session.is_revoked);
    }
}
