//! `POST /api/upload`: editor image upload, rate limited per client IP.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{ConnectInfo, Multipart, State};
use axum::http::StatusCode;
use serde::Serialize;

use super::auth::EditorUser;
use crate::error::ApiError;
use crate::services::upload::{self, UploadError};
use crate::state::AppState;

/// Multipart field carrying the file.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge.into()
    } else {
        ApiError::Upload(err.body_text())
    }
}

pub async fn upload_image(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    EditorUser(user): EditorUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    state
        .upload_limiter
        .check_and_record(addr.ip())
        .map_err(|e| ApiError::RateLimited(e.to_string()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let url = upload::store_image(state.storage.as_ref(), bytes.to_vec(), content_type.as_deref()).await?;
        tracing::info!(user_id = %user.id, %url, "image uploaded");
        return Ok(Json(UploadResponse { url }));
    }

    Err(UploadError::MissingFile.into())
}
