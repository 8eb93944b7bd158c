//! Content records shared by the store, services, and routes.
//!
//! DESIGN
//! ======
//! Records mirror the persisted rows one-to-one. Enumerated columns are
//! stored as lowercase text (or the display label for tournament formats)
//! and parsed back through `parse`, which returns `None` for unknown values
//! so callers decide whether that is a validation or decode failure.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// ROLES
// =============================================================================

/// Access level of a user. Variants are declared in ascending privilege so
/// the derived ordering is the capability order: `User < Editor < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Editor,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "editor" => Some(Self::Editor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// True when this role grants at least the `required` level.
    #[must_use]
    pub fn allows(self, required: Role) -> bool {
        self >= required
    }
}

// =============================================================================
// STATUSES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
}

impl ArticleStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl TournamentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Some(Self::Upcoming),
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Pairing system of a tournament. Serialized with its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TournamentFormat {
    Swiss,
    #[serde(rename = "Round Robin")]
    RoundRobin,
    Knockout,
    Blitz,
    Rapid,
    Classical,
}

impl TournamentFormat {
    pub const ALL: [Self; 6] =
        [Self::Swiss, Self::RoundRobin, Self::Knockout, Self::Blitz, Self::Rapid, Self::Classical];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swiss => "Swiss",
            Self::RoundRobin => "Round Robin",
            Self::Knockout => "Knockout",
            Self::Blitz => "Blitz",
            Self::Rapid => "Rapid",
            Self::Classical => "Classical",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(wanted))
    }
}

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub bio: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: String,
    pub category_id: Option<Uuid>,
    /// Cleared when the author account is deleted.
    pub author_id: Option<Uuid>,
    pub status: ArticleStatus,
    pub views: i64,
    pub tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub featured_image: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub location: String,
    pub format: TournamentFormat,
    pub prize: String,
    pub organizer: String,
    pub participants: i32,
    pub status: TournamentStatus,
    pub tags: Vec<String>,
    pub author_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Bearer session. Only the SHA-256 digest of the token is persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: OffsetDateTime,
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
