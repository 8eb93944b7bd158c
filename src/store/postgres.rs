//! PostgreSQL content store.
//!
//! DESIGN
//! ======
//! Plain `sqlx::query` + `Row::try_get` mapping, with `QueryBuilder` for the
//! filtered listings. Enumerated columns are TEXT guarded by CHECK
//! constraints; unique constraints are named `<table>_<column>_key` and
//! surface through `StoreError::Duplicate`.
//!
//! The view counter is bumped with `views = views + 1 ... RETURNING` so the
//! increment happens inside a single statement, and full-record updates
//! never write the `views` column.

use std::collections::HashMap;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{ArticleQuery, ArticleSort, ContentStore, StoreError, TournamentQuery, TournamentSort};
use crate::models::{
    Article, ArticleStatus, Category, Role, Session, Tournament, TournamentFormat, TournamentStatus, User,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_active, bio, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, name, slug, description, image, created_at, updated_at";
const ARTICLE_COLUMNS: &str = "id, title, slug, content, excerpt, featured_image, category_id, author_id, \
                               status, views, tags, published_at, created_at, updated_at";
const TOURNAMENT_COLUMNS: &str = "id, title, slug, description, featured_image, date, location, format, prize, \
                                  organizer, participants, status, tags, author_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// =============================================================================
// ROW MAPPING
// =============================================================================

fn decode<T>(column: &str, raw: &str, parsed: Option<T>) -> Result<T, StoreError> {
    parsed.ok_or_else(|| StoreError::Decode(format!("{column}={raw}")))
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: decode("role", &role, Role::parse(&role))?,
        is_active: row.try_get("is_active")?,
        bio: row.try_get("bio")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn article_from_row(row: &PgRow) -> Result<Article, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        content: row.try_get("content")?,
        excerpt: row.try_get("excerpt")?,
        featured_image: row.try_get("featured_image")?,
        category_id: row.try_get("category_id")?,
        author_id: row.try_get("author_id")?,
        status: decode("status", &status, ArticleStatus::parse(&status))?,
        views: row.try_get("views")?,
        tags: row.try_get("tags")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn tournament_from_row(row: &PgRow) -> Result<Tournament, StoreError> {
    let status: String = row.try_get("status")?;
    let format: String = row.try_get("format")?;
    Ok(Tournament {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        featured_image: row.try_get("featured_image")?,
        date: row.try_get("date")?,
        location: row.try_get("location")?,
        format: decode("format", &format, TournamentFormat::parse(&format))?,
        prize: row.try_get("prize")?,
        organizer: row.try_get("organizer")?,
        participants: row.try_get("participants")?,
        status: decode("status", &status, TournamentStatus::parse(&status))?,
        tags: row.try_get("tags")?,
        author_id: row.try_get("author_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn collect<T>(rows: &[PgRow], map: fn(&PgRow) -> Result<T, StoreError>) -> Result<Vec<T>, StoreError> {
    rows.iter().map(map).collect()
}

// =============================================================================
// LISTING FILTERS
// =============================================================================

/// Escape LIKE wildcards so user input is matched literally.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn trimmed_search(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}

fn push_article_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ArticleQuery) {
    builder.push(" WHERE TRUE");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(search) = trimmed_search(query.search.as_deref()) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR excerpt ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_tournament_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &TournamentQuery) {
    builder.push(" WHERE TRUE");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = trimmed_search(query.search.as_deref()) {
        let pattern = like_pattern(search);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR location ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn article_order(sort: ArticleSort) -> &'static str {
    match sort {
        ArticleSort::Newest => " ORDER BY published_at DESC NULLS LAST, created_at DESC",
        ArticleSort::MostViewed => " ORDER BY views DESC, published_at DESC NULLS LAST",
        ArticleSort::Created => " ORDER BY created_at DESC",
    }
}

fn tournament_order(sort: TournamentSort) -> &'static str {
    match sort {
        TournamentSort::DateAsc => " ORDER BY date ASC, lower(title) ASC",
        TournamentSort::DateDesc => " ORDER BY date DESC, lower(title) ASC",
        TournamentSort::Title => " ORDER BY lower(title) ASC",
        TournamentSort::Created => " ORDER BY created_at DESC",
    }
}

// =============================================================================
// TRAIT IMPL
// =============================================================================

#[async_trait::async_trait]
impl ContentStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO users (id, name, email, password_hash, role, is_active, bio, created_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(&user.bio)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE users
              SET name = $2, email = $3, password_hash = $4, role = $5, is_active = $6, bio = $7, updated_at = $8
              WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(&user.bio)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, user_from_row)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, user_from_row)
    }

    async fn recent_users(&self, limit: i64) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, user_from_row)
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token_hash)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str, now: OffsetDateTime) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            "SELECT token_hash, user_id, expires_at FROM sessions WHERE token_hash = $1 AND expires_at > $2",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(Session {
                token_hash: r.try_get("token_hash")?,
                user_id: r.try_get("user_id")?,
                expires_at: r.try_get("expires_at")?,
            })
        })
        .transpose()
    }

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO categories (id, name, slug, description, image, created_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.image)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE categories SET name = $2, slug = $3, description = $4, image = $5, updated_at = $6
              WHERE id = $1",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.image)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError> {
        // `articles.category_id` is ON DELETE SET NULL.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name ASC"))
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, category_from_row)
    }

    async fn categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        collect(&rows, category_from_row)
    }

    async fn published_counts_by_category(&self) -> Result<HashMap<Uuid, i64>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r"SELECT category_id, COUNT(*)
              FROM articles
              WHERE status = 'published' AND category_id IS NOT NULL
              GROUP BY category_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn insert_article(&self, article: &Article) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO articles
                (id, title, slug, content, excerpt, featured_image, category_id, author_id,
                 status, views, tags, published_at, created_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.featured_image)
        .bind(article.category_id)
        .bind(article.author_id)
        .bind(article.status.as_str())
        .bind(article.views)
        .bind(&article.tags)
        .bind(article.published_at)
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_article(&self, article: &Article) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE articles
              SET title = $2, slug = $3, content = $4, excerpt = $5, featured_image = $6,
                  category_id = $7, status = $8, tags = $9, published_at = $10, updated_at = $11
              WHERE id = $1",
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.featured_image)
        .bind(article.category_id)
        .bind(article.status.as_str())
        .bind(&article.tags)
        .bind(article.published_at)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_article(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_article(&self, id: Uuid) -> Result<Option<Article>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn record_article_view(&self, slug: &str) -> Result<Option<Article>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE articles SET views = views + 1
             WHERE slug = $1 AND status = 'published'
             RETURNING {ARTICLE_COLUMNS}"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn list_articles(&self, query: &ArticleQuery) -> Result<(Vec<Article>, i64), StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM articles");
        push_article_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {ARTICLE_COLUMNS} FROM articles"));
        push_article_filters(&mut select, query);
        select.push(article_order(query.sort));
        if let Some(page) = query.page {
            select
                .push(" LIMIT ")
                .push_bind(page.limit)
                .push(" OFFSET ")
                .push_bind(page.offset());
        }
        let rows = select.build().fetch_all(&self.pool).await?;
        Ok((collect(&rows, article_from_row)?, total))
    }

    async fn recent_articles(&self, limit: i64) -> Result<Vec<Article>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        collect(&rows, article_from_row)
    }

    async fn count_articles(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn total_article_views(&self) -> Result<i64, StoreError> {
        Ok(sqlx::query_scalar("SELECT COALESCE(SUM(views), 0)::BIGINT FROM articles")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn insert_tournament(&self, tournament: &Tournament) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO tournaments
                (id, title, slug, description, featured_image, date, location, format, prize,
                 organizer, participants, status, tags, author_id, created_at, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(tournament.id)
        .bind(&tournament.title)
        .bind(&tournament.slug)
        .bind(&tournament.description)
        .bind(&tournament.featured_image)
        .bind(tournament.date)
        .bind(&tournament.location)
        .bind(tournament.format.as_str())
        .bind(&tournament.prize)
        .bind(&tournament.organizer)
        .bind(tournament.participants)
        .bind(tournament.status.as_str())
        .bind(&tournament.tags)
        .bind(tournament.author_id)
        .bind(tournament.created_at)
        .bind(tournament.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_tournament(&self, tournament: &Tournament) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE tournaments
              SET title = $2, slug = $3, description = $4, featured_image = $5, date = $6, location = $7,
                  format = $8, prize = $9, organizer = $10, participants = $11, status = $12, tags = $13,
                  updated_at = $14
              WHERE id = $1",
        )
        .bind(tournament.id)
        .bind(&tournament.title)
        .bind(&tournament.slug)
        .bind(&tournament.description)
        .bind(&tournament.featured_image)
        .bind(tournament.date)
        .bind(&tournament.location)
        .bind(tournament.format.as_str())
        .bind(&tournament.prize)
        .bind(&tournament.organizer)
        .bind(tournament.participants)
        .bind(tournament.status.as_str())
        .bind(&tournament.tags)
        .bind(tournament.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_tournament(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tournaments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_tournament(&self, id: Uuid) -> Result<Option<Tournament>, StoreError> {
        let row = sqlx::query(&format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn find_tournament_by_slug(&self, slug: &str) -> Result<Option<Tournament>, StoreError> {
        let row = sqlx::query(&format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn list_tournaments(&self, query: &TournamentQuery) -> Result<(Vec<Tournament>, i64), StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tournaments");
        push_tournament_filters(&mut count, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments"));
        push_tournament_filters(&mut select, query);
        select.push(tournament_order(query.sort));
        if let Some(page) = query.page {
            select
                .push(" LIMIT ")
                .push_bind(page.limit)
                .push(" OFFSET ")
                .push_bind(page.offset());
        }
        let rows = select.build().fetch_all(&self.pool).await?;
        Ok((collect(&rows, tournament_from_row)?, total))
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
