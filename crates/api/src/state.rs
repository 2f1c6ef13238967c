use std::sync::Arc;

use keygate_db::store::PgAuthStore;

use crate::auth::jwt::TokenService;
use crate::auth::service::AuthService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already
/// `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: keygate_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Token issuer/validator used by the authentication guard.
    pub tokens: TokenService,
    /// Session lifecycle service backed by Postgres.
    pub auth: AuthService<PgAuthStore>,
}
