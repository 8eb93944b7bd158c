//! JSON error envelope for the REST surface.
//!
//! DESIGN
//! ======
//! Every handler returns `Result<_, ApiError>`. The variant picks the status
//! code; the body is always `{ "message": ... }`, with an `error` field that
//! carries internal detail only when detail exposure is switched on (any
//! non-production environment).

use std::sync::OnceLock;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::store::StoreError;

static EXPOSE_INTERNAL_DETAILS: OnceLock<bool> = OnceLock::new();

/// Decide once, at startup, whether 500 responses include the underlying
/// error text. Later calls are ignored; unset means exposed.
pub fn expose_internal_details(enabled: bool) {
    if EXPOSE_INTERNAL_DETAILS.set(enabled).is_err() {
        tracing::warn!("internal detail exposure already configured");
    }
}

fn internal_details_exposed() -> bool {
    EXPOSE_INTERNAL_DETAILS.get().copied().unwrap_or(true)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Upload(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Duplicate(_) | Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Wire body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    fn internal(detail: String, expose: bool) -> Self {
        Self { message: "Something went wrong!".to_owned(), error: expose.then_some(detail) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                ErrorBody::internal(detail, internal_details_exposed())
            }
            other => ErrorBody { message: other.to_string(), error: None },
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => Self::Duplicate(format!("Duplicate key: {key}")),
            StoreError::NotFound => Self::NotFound("Record not found".to_owned()),
            other => Self::internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or_else(|| format!("{field} is invalid"), ToString::to_string))
                    .collect::<Vec<_>>()
            })
            .collect();
        if messages.is_empty() {
            return Self::Validation(err.to_string());
        }
        messages.sort();
        Self::Validation(messages.join("; "))
    }
}

/// Extension for store results whose duplicate-key failure deserves a
/// domain-specific message.
pub trait DuplicateAs<T> {
    fn duplicate_as(self, message: &str) -> Result<T, ApiError>;
}

impl<T> DuplicateAs<T> for Result<T, StoreError> {
    fn duplicate_as(self, message: &str) -> Result<T, ApiError> {
        self.map_err(|err| match err {
            StoreError::Duplicate(_) => ApiError::Duplicate(message.to_owned()),
            other => other.into(),
        })
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
