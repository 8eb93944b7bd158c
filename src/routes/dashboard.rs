//! `GET /api/dashboard/stats` (admin).

use axum::Json;
use axum::extract::State;

use super::auth::AdminUser;
use crate::error::ApiError;
use crate::services::dashboard::{self, DashboardStats};
use crate::state::AppState;

pub async fn stats(State(state): State<AppState>, AdminUser(_): AdminUser) -> Result<Json<DashboardStats>, ApiError> {
    dashboard::stats(state.store.as_ref()).await.map(Json)
}
