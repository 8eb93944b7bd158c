//! Category routes. Reads are public; writes require an admin.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::auth::AdminUser;
use super::extract::JsonBody;
use super::{Message, parse_id};
use crate::error::ApiError;
use crate::models::Category;
use crate::services::categories::{self, CategoryInput, CategoryWithCount};
use crate::state::AppState;

/// `GET /api/categories`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CategoryWithCount>>, ApiError> {
    categories::list_categories(state.store.as_ref()).await.map(Json)
}

/// `GET /api/categories/{slug}`
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, ApiError> {
    categories::get_category(state.store.as_ref(), &slug).await.map(Json)
}

/// `POST /api/categories`
pub async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    JsonBody(input): JsonBody<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = categories::create_category(state.store.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /api/categories/{id}`
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CategoryInput>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_id(&id, "Category")?;
    categories::update_category(state.store.as_ref(), id, input).await.map(Json)
}

/// `DELETE /api/categories/{id}`
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id, "Category")?;
    categories::delete_category(state.store.as_ref(), id).await?;
    Ok(Json(Message { message: "Category deleted" }))
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
