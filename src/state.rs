//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the content store, the object storage used for uploads, the upload
//! rate limiter, and the auth settings. Every field is cheap to clone.

use std::sync::Arc;

use crate::rate_limit::RateLimiter;
use crate::services::auth::AuthSettings;
use crate::services::storage::ObjectStorage;
use crate::store::ContentStore;

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub storage: Arc<dyn ObjectStorage>,
    /// Per-IP sliding window for `POST /api/upload`.
    pub upload_limiter: RateLimiter,
    pub auth: AuthSettings,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn ContentStore>,
        storage: Arc<dyn ObjectStorage>,
        upload_limiter: RateLimiter,
        auth: AuthSettings,
    ) -> Self {
        Self { store, storage, upload_limiter, auth }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
