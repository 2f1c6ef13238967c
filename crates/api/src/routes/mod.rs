//! Route tables.

pub mod auth;
pub mod health;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register   register (public)
/// /auth/login      login (public)
/// /auth/refresh    refresh (public)
/// /auth/logout     logout (requires auth)
/// /auth/revoke     revoke session (requires auth)
///
/// /users           list users (requires auth)
/// /users/{id}      get user (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", user::router())
}
