//! Tournament routes. Reads are public; writes require an editor.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::auth::EditorUser;
use super::extract::{JsonBody, QueryParams};
use super::{Message, parse_id};
use crate::error::ApiError;
use crate::services::tournaments::{self, TournamentInput, TournamentListParams, TournamentPage, TournamentView};
use crate::state::AppState;

/// `GET /api/tournaments`
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<TournamentListParams>,
) -> Result<Json<TournamentPage>, ApiError> {
    tournaments::list_tournaments(state.store.as_ref(), params).await.map(Json)
}

/// `GET /api/tournaments/admin`
pub async fn list_admin(
    State(state): State<AppState>,
    EditorUser(_): EditorUser,
) -> Result<Json<Vec<TournamentView>>, ApiError> {
    tournaments::list_all(state.store.as_ref()).await.map(Json)
}

/// `GET /api/tournaments/{slug}`
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TournamentView>, ApiError> {
    tournaments::get_tournament(state.store.as_ref(), &slug).await.map(Json)
}

/// `POST /api/tournaments`
pub async fn create(
    State(state): State<AppState>,
    EditorUser(author): EditorUser,
    JsonBody(input): JsonBody<TournamentInput>,
) -> Result<(StatusCode, Json<TournamentView>), ApiError> {
    let view = tournaments::create_tournament(state.store.as_ref(), &author, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `PUT /api/tournaments/{id}`
pub async fn update(
    State(state): State<AppState>,
    EditorUser(_): EditorUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<TournamentInput>,
) -> Result<Json<TournamentView>, ApiError> {
    let id = parse_id(&id, "Tournament")?;
    tournaments::update_tournament(state.store.as_ref(), id, input).await.map(Json)
}

/// `DELETE /api/tournaments/{id}`
pub async fn delete(
    State(state): State<AppState>,
    EditorUser(_): EditorUser,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id, "Tournament")?;
    tournaments::delete_tournament(state.store.as_ref(), id).await?;
    Ok(Json(Message { message: "Tournament deleted successfully" }))
}

#[cfg(test)]
#[path = "tournaments_test.rs"]
mod tests;
