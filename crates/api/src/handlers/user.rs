//! Handlers for the `/users` resource. All routes require authentication.

use axum::extract::{Path, State};
use axum::Json;
use keygate_core::error::CoreError;
use keygate_core::types::DbId;
use keygate_db::models::user::UserResponse;
use keygate_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "user",
                id: id.to_string(),
            })
        })?;

    Ok(Json(UserResponse::from(&user)))
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = UserRepo::list(&state.pool).await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}
