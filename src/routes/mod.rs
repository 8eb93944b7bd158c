//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API under `/api`, mounts the local media
//! directory when uploads are stored on disk, and serves the built
//! single-page front end for every other path. Unmatched `/api/*` requests
//! always get the JSON 404, never the SPA.

pub mod articles;
pub mod auth;
pub mod categories;
pub mod dashboard;
mod extract;
pub mod tournaments;
pub mod upload;
pub mod users;

use std::any::Any;
use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::{AppConfig, StorageConfig};
use crate::error::ApiError;
use crate::services::upload::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Request body cap on the upload route: the file limit plus multipart
/// framing. Larger files are rejected by the service with a 400.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

// =============================================================================
// SHARED RESPONSE PIECES
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// Parse a path id. A malformed id cannot name an existing record.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::not_found(what))
}

// =============================================================================
// STATIC ASSETS
// =============================================================================

/// Directories served next to the API.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    /// Built SPA; unmatched non-API paths fall back to its `index.html`.
    pub spa_dir: Option<PathBuf>,
    /// URL path and directory of locally stored uploads.
    pub media: Option<(String, PathBuf)>,
}

impl StaticAssets {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let media = match &config.storage {
            StorageConfig::Local { dir, public_url } if public_url.starts_with('/') && public_url.len() > 1 => {
                Some((public_url.clone(), dir.clone()))
            }
            _ => None,
        };
        Self { spa_dir: config.static_dir.clone(), media }
    }
}

// =============================================================================
// ROUTER
// =============================================================================

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/articles", get(articles::list).post(articles::create))
        .route("/api/articles/admin", get(articles::list_admin))
        .route(
            "/api/articles/{slug_or_id}",
            get(articles::get_by_slug)
                .put(articles::update)
                .delete(articles::delete),
        )
        .route("/api/categories", get(categories::list).post(categories::create))
        .route(
            "/api/categories/{slug_or_id}",
            get(categories::get_by_slug)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/api/tournaments", get(tournaments::list).post(tournaments::create))
        .route("/api/tournaments/admin", get(tournaments::list_admin))
        .route(
            "/api/tournaments/{slug_or_id}",
            get(tournaments::get_by_slug)
                .put(tournaments::update)
                .delete(tournaments::delete),
        )
        .route("/api/users", get(users::list))
        .route("/api/users/{id}", get(users::get).put(users::update).delete(users::delete))
        .route(
            "/api/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/{*rest}", any(not_found))
}

/// Full application router: API, media, SPA fallback, and the shared
/// middleware stack.
pub fn app(state: AppState, assets: &StaticAssets) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);

    let mut router = api_routes();
    if let Some((mount, dir)) = &assets.media {
        router = router.nest_service(mount, ServeDir::new(dir));
    }
    router = match &assets.spa_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))),
        None => router.fallback(not_found),
    };

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "Chess News API is running" }))
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Route not found" }))).into_response()
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::internal("request handler panicked").into_response()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
