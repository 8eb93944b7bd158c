//! Article routes.
//!
//! `GET /api/articles/{slug}` shares its path segment with the id-based
//! write routes, so the segment is taken as a string and parsed per method.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::auth::EditorUser;
use super::extract::{JsonBody, QueryParams};
use super::{Message, parse_id};
use crate::error::ApiError;
use crate::services::articles::{self, ArticleInput, ArticleListParams, ArticlePage, ArticleView};
use crate::state::AppState;

/// `GET /api/articles`
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ArticleListParams>,
) -> Result<Json<ArticlePage>, ApiError> {
    articles::list_published(state.store.as_ref(), params).await.map(Json)
}

/// `GET /api/articles/admin`
pub async fn list_admin(
    State(state): State<AppState>,
    EditorUser(_): EditorUser,
) -> Result<Json<Vec<ArticleView>>, ApiError> {
    articles::list_all(state.store.as_ref()).await.map(Json)
}

/// `GET /api/articles/{slug}`
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleView>, ApiError> {
    articles::read_published(state.store.as_ref(), &slug).await.map(Json)
}

/// `POST /api/articles`
pub async fn create(
    State(state): State<AppState>,
    EditorUser(author): EditorUser,
    JsonBody(input): JsonBody<ArticleInput>,
) -> Result<(StatusCode, Json<ArticleView>), ApiError> {
    let view = articles::create_article(state.store.as_ref(), &author, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `PUT /api/articles/{id}`
pub async fn update(
    State(state): State<AppState>,
    EditorUser(_): EditorUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ArticleInput>,
) -> Result<Json<ArticleView>, ApiError> {
    let id = parse_id(&id, "Article")?;
    articles::update_article(state.store.as_ref(), id, input).await.map(Json)
}

/// `DELETE /api/articles/{id}`
pub async fn delete(
    State(state): State<AppState>,
    EditorUser(_): EditorUser,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id, "Article")?;
    articles::delete_article(state.store.as_ref(), id).await?;
    Ok(Json(Message { message: "Article deleted" }))
}

#[cfg(test)]
#[path = "articles_test.rs"]
mod tests;
