//! Credential auth: registration, login, and bearer-token resolution.
//!
//! SYSTEM CONTEXT
//! ==============
//! Routes call [`register`] and [`login`] to mint session tokens and the
//! `AuthUser` extractor calls [`authenticate`] on every protected request.
//! Role gating happens after authentication via [`require_role`].
//!
//! Passwords are bcrypt hashes; hashing and verification run on the
//! blocking pool.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;
use validator::Validate;

use super::session;
use crate::error::{ApiError, DuplicateAs};
use crate::models::{Role, User};
use crate::store::ContentStore;

/// Session lifetime and bcrypt cost, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(crate::config::DEFAULT_SESSION_TTL_HOURS),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

// =============================================================================
// REQUESTS / RESPONSES
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[serde(default)]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[serde(default)]
    pub password: String,
}

/// Profile plus the freshly issued bearer token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

// =============================================================================
// PASSWORDS
// =============================================================================

/// Hash a password on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(ApiError::internal)?
        .map_err(|e| ApiError::internal(format!("failed to hash password: {e}")))
}

/// Verify a password on the blocking pool. A malformed stored hash counts
/// as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(ApiError::internal)?;
    Ok(verified.unwrap_or(false))
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Create a `user`-role account and sign it in.
pub async fn register(
    store: &dyn ContentStore,
    settings: AuthSettings,
    mut req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    req.name = req.name.trim().to_owned();
    req.email = normalize_email(&req.email);
    req.validate()?;

    if store.find_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Duplicate("User already exists".to_owned()));
    }

    let now = OffsetDateTime::now_utc();
    let user = User {
        id: Uuid::new_v4(),
        name: req.name,
        email: req.email,
        password_hash: hash_password(req.password, settings.bcrypt_cost).await?,
        role: Role::User,
        is_active: true,
        bio: String::new(),
        created_at: now,
        updated_at: now,
    };
    store.insert_user(&user).await.duplicate_as("User already exists")?;

    let token = session::create_session(store, user.id, settings.session_ttl).await?;
    tracing::info!(user_id = %user.id, "user registered");
    Ok(AuthResponse { user, token })
}

/// Check credentials and issue a token.
pub async fn login(
    store: &dyn ContentStore,
    settings: AuthSettings,
    req: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    req.validate()?;
    let Some(user) = store.find_user_by_email(&normalize_email(&req.email)).await? else {
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password(req.password, user.password_hash.clone()).await? {
        return Err(ApiError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_owned()));
    }

    let token = session::create_session(store, user.id, settings.session_ttl).await?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse { user, token })
}

/// Resolve a bearer token to an active user.
pub async fn authenticate(store: &dyn ContentStore, token: &str) -> Result<User, ApiError> {
    let user = session::validate_session(store, token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, token failed".to_owned()))?;
    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_owned()));
    }
    Ok(user)
}

/// Single role gate: the user's role must be at least `required`.
pub fn require_role(user: &User, required: Role) -> Result<(), ApiError> {
    if user.role.allows(required) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role.as_str()
        )))
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
