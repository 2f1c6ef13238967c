//! Handlers for the `/auth` resource (register, login, refresh, logout,
//! revoke).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use keygate_core::types::Timestamp;
use keygate_db::models::user::{CreateUser, UserResponse};
use keygate_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::jwt::Claims;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(email, length(min = 1, max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email, length(min = 1, max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Request body for `POST /auth/logout` and `POST /auth/revoke`.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: Uuid,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_expires_at: Timestamp,
    pub refresh_token_expires_at: Timestamp,
    pub user: UserResponse,
}

/// Successful refresh response.
#[derive(Debug, Serialize)]
pub struct RenewAccessTokenResponse {
    pub access_token: String,
    pub access_token_expires_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create a new user account. Returns 201 with the safe user
/// representation; duplicate username or email yields 409.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    input.validate()?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns access and refresh tokens
/// plus the persisted session id.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    input.validate()?;

    let outcome = state.auth.login(&input.email, &input.password).await?;

    Ok(Json(LoginResponse {
        session_id: outcome.session.id,
        access_token_expires_at: claims_expiry(&outcome.access_claims)?,
        refresh_token_expires_at: claims_expiry(&outcome.refresh_claims)?,
        user: UserResponse {
            id: outcome.access_claims.id,
            username: outcome.access_claims.username.clone(),
            email: outcome.access_claims.email.clone(),
        },
        access_token: outcome.access_token,
        refresh_token: outcome.refresh_token,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for a new access token. The refresh
/// token itself is not rotated and no new session is created.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<RenewAccessTokenResponse>> {
    input.validate()?;

    let (access_token, access_claims) = state.auth.renew_access_token(&input.refresh_token).await?;

    Ok(Json(RenewAccessTokenResponse {
        access_token,
        access_token_expires_at: claims_expiry(&access_claims)?,
    }))
}

/// POST /api/v1/auth/logout
///
/// Hard-delete one session. Returns 204 No Content, also when the session
/// was already gone.
pub async fn logout(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<SessionRequest>,
) -> AppResult<StatusCode> {
    state.auth.logout(input.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/revoke
///
/// Soft-invalidate one session; the row stays behind for the cleanup
/// sweep. Returns 204 No Content.
pub async fn revoke_session(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<SessionRequest>,
) -> AppResult<StatusCode> {
    state.auth.revoke_session(input.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn claims_expiry(claims: &Claims) -> AppResult<Timestamp> {
    claims
        .expires_at()
        .ok_or_else(|| AppError::InternalError("Token expiry out of range".to_string()))
}
