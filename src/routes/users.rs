//! Admin user management routes.

use axum::Json;
use axum::extract::{Path, State};

use super::auth::AdminUser;
use super::extract::JsonBody;
use super::parse_id;
use crate::error::ApiError;
use crate::models::User;
use crate::services::users::{self, DeletedMessage, UserUpdate};
use crate::state::AppState;

/// `GET /api/users`
pub async fn list(State(state): State<AppState>, AdminUser(_): AdminUser) -> Result<Json<Vec<User>>, ApiError> {
    users::list_users(state.store.as_ref()).await.map(Json)
}

/// `GET /api/users/{id}`
pub async fn get(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id, "User")?;
    users::get_user(state.store.as_ref(), id).await.map(Json)
}

/// `PUT /api/users/{id}`
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id, "User")?;
    users::update_user(state.store.as_ref(), id, update).await.map(Json)
}

/// `DELETE /api/users/{id}`
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedMessage>, ApiError> {
    let id = parse_id(&id, "User")?;
    users::delete_user(state.store.as_ref(), id).await.map(Json)
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
