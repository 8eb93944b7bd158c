//! In-process content store.
//!
//! DESIGN
//! ======
//! All collections live behind one `RwLock`, so every write (including the
//! view-counter increment) is a single critical section and uniqueness
//! checks see a consistent snapshot. Used when `DATABASE_URL` is not set
//! and by the test suite. Data is lost on restart.

use std::cmp::Ordering;
use std::collections::HashMap;

use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ArticleQuery, ArticleSort, ContentStore, StoreError, TournamentQuery, TournamentSort};
use crate::models::{Article, ArticleStatus, Category, Session, Tournament, User};

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    sessions: HashMap<String, Session>,
    categories: HashMap<Uuid, Category>,
    articles: HashMap<Uuid, Article>,
    tournaments: HashMap<Uuid, Tournament>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn normalized_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// Descending order with `None` last, matching `DESC NULLS LAST`.
fn cmp_desc_nulls_last(a: Option<OffsetDateTime>, b: Option<OffsetDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn sort_articles(articles: &mut [Article], sort: ArticleSort) {
    articles.sort_by(|a, b| match sort {
        ArticleSort::Newest => cmp_desc_nulls_last(a.published_at, b.published_at)
            .then_with(|| b.created_at.cmp(&a.created_at)),
        ArticleSort::MostViewed => b
            .views
            .cmp(&a.views)
            .then_with(|| cmp_desc_nulls_last(a.published_at, b.published_at)),
        ArticleSort::Created => b.created_at.cmp(&a.created_at),
    });
}

/// Case-insensitive title order, matching `ORDER BY lower(title)`.
fn cmp_titles(a: &Tournament, b: &Tournament) -> Ordering {
    a.title.to_lowercase().cmp(&b.title.to_lowercase())
}

fn sort_tournaments(tournaments: &mut [Tournament], sort: TournamentSort) {
    tournaments.sort_by(|a, b| match sort {
        TournamentSort::DateAsc => a.date.cmp(&b.date).then_with(|| cmp_titles(a, b)),
        TournamentSort::DateDesc => b.date.cmp(&a.date).then_with(|| cmp_titles(a, b)),
        TournamentSort::Title => cmp_titles(a, b),
        TournamentSort::Created => b.created_at.cmp(&a.created_at),
    });
}

fn limit_to_usize(limit: i64) -> usize {
    usize::try_from(limit.max(0)).unwrap_or(usize::MAX)
}

fn total_of(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

// =============================================================================
// TRAIT IMPL
// =============================================================================

#[async_trait::async_trait]
impl ContentStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".into()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        if inner
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Duplicate("email".into()));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.remove(&id).is_none() {
            return Ok(false);
        }
        inner.sessions.retain(|_, s| s.user_id != id);
        for article in inner.articles.values_mut() {
            if article.author_id == Some(id) {
                article.author_id = None;
            }
        }
        for tournament in inner.tournaments.values_mut() {
            if tournament.author_id == Some(id) {
                tournament.author_id = None;
            }
        }
        Ok(true)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| inner.users.get(id).cloned()).collect())
    }

    async fn recent_users(&self, limit: i64) -> Result<Vec<User>, StoreError> {
        let mut users = self.list_users().await?;
        users.truncate(limit_to_usize(limit));
        Ok(users)
    }

    async fn count_users(&self) -> Result<i64, StoreError> {
        Ok(total_of(self.inner.read().await.users.len()))
    }

    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.sessions.contains_key(&session.token_hash) {
            return Err(StoreError::Duplicate("token_hash".into()));
        }
        inner
            .sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token_hash: &str, now: OffsetDateTime) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sessions
            .get(token_hash)
            .filter(|s| s.expires_at > now)
            .cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        check_category_unique(&inner, category)?;
        inner.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.categories.contains_key(&category.id) {
            return Err(StoreError::NotFound);
        }
        check_category_unique(&inner, category)?;
        inner.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for article in inner.articles.values_mut() {
            if article.category_id == Some(id) {
                article.category_id = None;
            }
        }
        Ok(true)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, StoreError> {
        Ok(self.inner.read().await.categories.get(&id).cloned())
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let inner = self.inner.read().await;
        let mut categories: Vec<Category> = inner.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn categories_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Category>, StoreError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.categories.get(id).cloned())
            .collect())
    }

    async fn published_counts_by_category(&self) -> Result<HashMap<Uuid, i64>, StoreError> {
        let inner = self.inner.read().await;
        let mut counts = HashMap::new();
        for article in inner.articles.values() {
            if article.status != ArticleStatus::Published {
                continue;
            }
            if let Some(category_id) = article.category_id {
                *counts.entry(category_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn insert_article(&self, article: &Article) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.articles.values().any(|a| a.slug == article.slug) {
            return Err(StoreError::Duplicate("slug".into()));
        }
        inner.articles.insert(article.id, article.clone());
        Ok(())
    }

    async fn update_article(&self, article: &Article) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.articles.get(&article.id) else {
            return Err(StoreError::NotFound);
        };
        // The counter is owned by `record_article_view`; a full-record update
        // must not roll it back to a stale value.
        let views = existing.views;
        if inner
            .articles
            .values()
            .any(|a| a.id != article.id && a.slug == article.slug)
        {
            return Err(StoreError::Duplicate("slug".into()));
        }
        let mut updated = article.clone();
        updated.views = views;
        inner.articles.insert(article.id, updated);
        Ok(())
    }

    async fn delete_article(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.articles.remove(&id).is_some())
    }

    async fn find_article(&self, id: Uuid) -> Result<Option<Article>, StoreError> {
        Ok(self.inner.read().await.articles.get(&id).cloned())
    }

    async fn record_article_view(&self, slug: &str) -> Result<Option<Article>, StoreError> {
        let mut inner = self.inner.write().await;
        let article = inner
            .articles
            .values_mut()
            .find(|a| a.slug == slug && a.status == ArticleStatus::Published);
        Ok(article.map(|a| {
            a.views += 1;
            a.clone()
        }))
    }

    async fn list_articles(&self, query: &ArticleQuery) -> Result<(Vec<Article>, i64), StoreError> {
        let inner = self.inner.read().await;
        let needle = normalized_search(query.search.as_deref());
        let mut matched: Vec<Article> = inner
            .articles
            .values()
            .filter(|a| query.status.is_none_or(|s| a.status == s))
            .filter(|a| query.category_id.is_none_or(|c| a.category_id == Some(c)))
            .filter(|a| {
                needle
                    .as_deref()
                    .is_none_or(|n| contains_ci(&a.title, n) || contains_ci(&a.excerpt, n))
            })
            .cloned()
            .collect();
        drop(inner);

        let total = total_of(matched.len());
        sort_articles(&mut matched, query.sort);
        let page = match query.page {
            Some(page) => page.slice(matched),
            None => matched,
        };
        Ok((page, total))
    }

    async fn recent_articles(&self, limit: i64) -> Result<Vec<Article>, StoreError> {
        let inner = self.inner.read().await;
        let mut articles: Vec<Article> = inner.articles.values().cloned().collect();
        drop(inner);
        sort_articles(&mut articles, ArticleSort::Created);
        articles.truncate(limit_to_usize(limit));
        Ok(articles)
    }

    async fn count_articles(&self) -> Result<i64, StoreError> {
        Ok(total_of(self.inner.read().await.articles.len()))
    }

    async fn total_article_views(&self) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.articles.values().map(|a| a.views).sum())
    }

    async fn insert_tournament(&self, tournament: &Tournament) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.tournaments.values().any(|t| t.slug == tournament.slug) {
            return Err(StoreError::Duplicate("slug".into()));
        }
        inner.tournaments.insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn update_tournament(&self, tournament: &Tournament) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.tournaments.contains_key(&tournament.id) {
            return Err(StoreError::NotFound);
        }
        if inner
            .tournaments
            .values()
            .any(|t| t.id != tournament.id && t.slug == tournament.slug)
        {
            return Err(StoreError::Duplicate("slug".into()));
        }
        inner.tournaments.insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn delete_tournament(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.tournaments.remove(&id).is_some())
    }

    async fn find_tournament(&self, id: Uuid) -> Result<Option<Tournament>, StoreError> {
        Ok(self.inner.read().await.tournaments.get(&id).cloned())
    }

    async fn find_tournament_by_slug(&self, slug: &str) -> Result<Option<Tournament>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.tournaments.values().find(|t| t.slug == slug).cloned())
    }

    async fn list_tournaments(&self, query: &TournamentQuery) -> Result<(Vec<Tournament>, i64), StoreError> {
        let inner = self.inner.read().await;
        let needle = normalized_search(query.search.as_deref());
        let mut matched: Vec<Tournament> = inner
            .tournaments
            .values()
            .filter(|t| query.status.is_none_or(|s| t.status == s))
            .filter(|t| {
                needle.as_deref().is_none_or(|n| {
                    contains_ci(&t.title, n) || contains_ci(&t.description, n) || contains_ci(&t.location, n)
                })
            })
            .cloned()
            .collect();
        drop(inner);

        let total = total_of(matched.len());
        sort_tournaments(&mut matched, query.sort);
        let page = match query.page {
            Some(page) => page.slice(matched),
            None => matched,
        };
        Ok((page, total))
    }
}

fn check_category_unique(inner: &Collections, category: &Category) -> Result<(), StoreError> {
    for other in inner.categories.values() {
        if other.id == category.id {
            continue;
        }
        if other.name == category.name {
            return Err(StoreError::Duplicate("name".into()));
        }
        if other.slug == category.slug {
            return Err(StoreError::Duplicate("slug".into()));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
