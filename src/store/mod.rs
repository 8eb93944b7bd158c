//! Content store: the persistence seam for every collection.
//!
//! ARCHITECTURE
//! ============
//! Services talk to `dyn ContentStore` so the same publishing and listing
//! rules run against PostgreSQL in production and against the in-process
//! memory store in development and tests. Each method is a single-record
//! (or single-statement) operation; there are no multi-document
//! transactions.
//!
//! INVARIANTS
//! ==========
//! - Unique keys (user email, category name/slug, article slug, tournament
//!   slug) are enforced by the backend and reported as
//!   [`StoreError::Duplicate`].
//! - [`ContentStore::record_article_view`] increments atomically; concurrent
//!   readers never lose an increment.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{Article, ArticleStatus, Category, Session, Tournament, TournamentStatus, User};
use crate::pagination::PageRequest;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint or
    /// field name.
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("record not found")]
    NotFound,
    #[error("invalid stored value: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::Duplicate(db.constraint().unwrap_or("unique").to_owned());
            }
        }
        Self::Database(err)
    }
}

// =============================================================================
// QUERIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleSort {
    /// Publish time, newest first.
    #[default]
    Newest,
    /// View count, highest first.
    MostViewed,
    /// Creation time, newest first.
    Created,
}

#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub status: Option<ArticleStatus>,
    pub category_id: Option<Uuid>,
    /// Case-insensitive substring matched against title OR excerpt.
    pub search: Option<String>,
    pub sort: ArticleSort,
    /// `None` returns the full result set.
    pub page: Option<PageRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TournamentSort {
    /// Event date, earliest first.
    #[default]
    DateAsc,
    DateDesc,
    Title,
    Created,
}

#[derive(Debug, Clone, Default)]
pub struct TournamentQuery {
    pub status: Option<TournamentStatus>,
    /// Case-insensitive substring matched against title, description, or
    /// location.
    pub search: Option<String>,
    pub sort: TournamentSort,
    pub page: Option<PageRequest>,
}

// =============================================================================
// TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    // ---- users ----
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// All users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;
    async fn recent_users(&self, limit: i64) -> Result<Vec<User>, StoreError>;
    async fn count_users(&self) -> Result<i64, StoreError>;

    // ---- sessions ----
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;
    /// Look up an unexpired session by token digest.
    async fn find_session(&self, token_hash: &str, now: OffsetDateTime) -> Result<Option<Session>, StoreError>;

    // ---- categories ----
    async fn insert_category(&self, category: &Category) -> Result<(), StoreError>;
    async fn update_category(&self, category: &Category) -> Result<(), StoreError>;
    /// Delete a category and clear it from any article that referenced it.
    async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError>;
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError>;
    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, StoreError>;
    /// Published-article count keyed by category id.
    async fn published_counts_by_category(&self) -> Result<HashMap<Uuid, i64>, StoreError>;

    // ---- articles ----
    async fn insert_article(&self, article: &Article) -> Result<(), StoreError>;
    async fn update_article(&self, article: &Article) -> Result<(), StoreError>;
    async fn delete_article(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn find_article(&self, id: Uuid) -> Result<Option<Article>, StoreError>;
    /// Atomically increment the view counter of a published article and
    /// return the updated record.
    async fn record_article_view(&self, slug: &str) -> Result<Option<Article>, StoreError>;
    /// Filtered, sorted listing plus the unpaginated match count.
    async fn list_articles(&self, query: &ArticleQuery) -> Result<(Vec<Article>, i64), StoreError>;
    async fn recent_articles(&self, limit: i64) -> Result<Vec<Article>, StoreError>;
    async fn count_articles(&self) -> Result<i64, StoreError>;
    /// Sum of view counters across all articles (zero when empty).
    async fn total_article_views(&self) -> Result<i64, StoreError>;

    // ---- tournaments ----
    async fn insert_tournament(&self, tournament: &Tournament) -> Result<(), StoreError>;
    async fn update_tournament(&self, tournament: &Tournament) -> Result<(), StoreError>;
    async fn delete_tournament(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn find_tournament(&self, id: Uuid) -> Result<Option<Tournament>, StoreError>;
    async fn find_tournament_by_slug(&self, slug: &str) -> Result<Option<Tournament>, StoreError>;
    async fn list_tournaments(&self, query: &TournamentQuery) -> Result<(Vec<Tournament>, i64), StoreError>;
}
