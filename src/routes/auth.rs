//! Auth routes and the bearer-token extractors.
//!
//! DESIGN
//! ======
//! `AuthUser` resolves `Authorization: Bearer <token>` to an active user.
//! `EditorUser` and `AdminUser` wrap it with the role gate so handlers
//! declare their access level in the signature.

use axum::Json;
use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use super::extract::JsonBody;
use crate::error::ApiError;
use crate::models::{Role, User};
use crate::services::auth::{self as auth_svc, AuthResponse, LoginRequest, RegisterRequest};
use crate::state::AppState;

// =============================================================================
// AUTH EXTRACTORS
// =============================================================================

/// Authenticated user extracted from the bearer token.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: User,
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("Not authorized, no token".to_owned()))?;
        let token = bearer.token().trim();
        if token.is_empty() {
            return Err(ApiError::Unauthorized("Not authorized, no token".to_owned()));
        }

        let app_state = AppState::from_ref(state);
        let user = auth_svc::authenticate(app_state.store.as_ref(), token).await?;
        Ok(Self { user })
    }
}

async fn user_with_role<S>(parts: &mut Parts, state: &S, required: Role) -> Result<User, ApiError>
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    let AuthUser { user } = AuthUser::from_request_parts(parts, state).await?;
    auth_svc::require_role(&user, required)?;
    Ok(user)
}

/// Authenticated user with at least the `editor` role.
pub struct EditorUser(pub User);

impl<S> FromRequestParts<S> for EditorUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, Role::Editor).await.map(Self)
    }
}

/// Authenticated user with the `admin` role.
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        user_with_role(parts, state, Role::Admin).await.map(Self)
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let resp = auth_svc::register(state.store.as_ref(), state.auth, req).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    auth_svc::login(state.store.as_ref(), state.auth, req).await.map(Json)
}

/// `GET /api/auth/me`
pub async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
