//! Bearer session management.
//!
//! ARCHITECTURE
//! ============
//! Login and registration mint an opaque 32-byte token. Clients present it
//! as `Authorization: Bearer <token>`; the store only ever sees its SHA-256
//! digest, so a leaked sessions table cannot be replayed.
//!
//! TRADE-OFFS
//! ==========
//! There is no revocation list or refresh rotation: a token is valid until
//! it expires or its user is deleted or deactivated.

use std::fmt::Write;

use rand::Rng;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::models::{Session, User};
use crate::store::{ContentStore, StoreError};

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Digest under which a token is persisted.
#[must_use]
pub fn hash_token(token: &str) -> String {
    bytes_to_hex(&Sha256::digest(token.as_bytes()))
}

/// Create a session for the given user, returning the raw token.
pub async fn create_session(store: &dyn ContentStore, user_id: Uuid, ttl: Duration) -> Result<String, StoreError> {
    let token = generate_token();
    let session = Session { token_hash: hash_token(&token), user_id, expires_at: OffsetDateTime::now_utc() + ttl };
    store.insert_session(&session).await?;
    Ok(token)
}

/// Resolve a token to its user. Unknown, expired, and orphaned sessions all
/// yield `None`; the caller decides how to treat inactive accounts.
pub async fn validate_session(store: &dyn ContentStore, token: &str) -> Result<Option<User>, StoreError> {
    if token.is_empty() {
        return Ok(None);
    }
    let Some(session) = store
        .find_session(&hash_token(token), OffsetDateTime::now_utc())
        .await?
    else {
        return Ok(None);
    };
    store.find_user(session.user_id).await
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
