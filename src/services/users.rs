//! User administration (admin only).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::auth::normalize_email;
use super::text::{non_blank, or_keep};
use crate::error::{ApiError, DuplicateAs};
use crate::models::{Role, User};
use crate::store::ContentStore;

/// Admin edit of a user. `isActive` is applied only when it is a JSON
/// boolean; any other value is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub is_active: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct DeletedMessage {
    pub message: &'static str,
}

pub async fn list_users(store: &dyn ContentStore) -> Result<Vec<User>, ApiError> {
    Ok(store.list_users().await?)
}

pub async fn get_user(store: &dyn ContentStore, id: Uuid) -> Result<User, ApiError> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))
}

pub async fn update_user(store: &dyn ContentStore, id: Uuid, update: UserUpdate) -> Result<User, ApiError> {
    let mut user = get_user(store, id).await?;

    let role = non_blank(update.role.as_deref())
        .map(|raw| Role::parse(raw).ok_or_else(|| ApiError::Validation(format!("Invalid role: {raw}"))))
        .transpose()?;

    user.name = or_keep(update.name.map(|n| n.trim().to_owned()), user.name);
    user.email = or_keep(update.email.as_deref().map(normalize_email), user.email);
    user.bio = or_keep(update.bio, user.bio);
    if let Some(role) = role {
        user.role = role;
    }
    if let Some(serde_json::Value::Bool(active)) = update.is_active {
        user.is_active = active;
    }
    user.updated_at = OffsetDateTime::now_utc();

    store.update_user(&user).await.duplicate_as("Email already in use")?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), active = user.is_active, "user updated");
    Ok(user)
}

/// Delete a user. Their content stays, with the author reference cleared.
pub async fn delete_user(store: &dyn ContentStore, id: Uuid) -> Result<DeletedMessage, ApiError> {
    if !store.delete_user(id).await? {
        return Err(ApiError::not_found("User"));
    }
    tracing::info!(user_id = %id, "user deleted");
    Ok(DeletedMessage { message: "User deleted" })
}

#[cfg(test)]
#[path = "users_test.rs"]
mod tests;
