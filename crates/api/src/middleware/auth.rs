//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use keygate_core::error::AuthError;

use crate::auth::jwt::{Claims, TokenService};
use crate::error::AppError;
use crate::state::AppState;

/// Parse and validate an `Authorization` header value.
///
/// A missing header, or one that does not start with the `Bearer` scheme
/// keyword, is [`AuthError::MissingHeader`]. The scheme keyword may be
/// followed by any amount of whitespace (including none) before the token
/// body. Anything past that point is up to the validator.
pub fn authenticate(header: Option<&str>, tokens: &TokenService) -> Result<Claims, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let token = header
        .strip_prefix("Bearer")
        .ok_or(AuthError::MissingHeader)?
        .trim_start();
    if token.is_empty() {
        return Err(AuthError::MissingHeader);
    }
    tokens.validate(token)
}

/// Authenticated caller extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication. It is purely a gate: on success the validated claims
/// ride along into the handler, on failure the request is rejected before
/// the handler runs.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(email = %user.claims.email, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The validated token claims for this request.
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let claims = authenticate(header, &state.tokens)?;

        Ok(AuthUser { claims })
    }
}
