//! Article publishing and retrieval.
//!
//! SYSTEM CONTEXT
//! ==============
//! Routes under `/api/articles` delegate here. This module owns the
//! publishing rules: slug and excerpt derivation, the draft/published
//! lifecycle, and the partial-update semantics where blank input keeps the
//! stored value.
//!
//! INVARIANTS
//! ==========
//! - `published_at` is set on the first save with status `published` and
//!   never moves afterwards.
//! - The slug is re-derived only when the title changes or an explicit slug
//!   is supplied.
//! - Public reads only ever see published articles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::text::{TagsInput, excerpt_from_html, non_blank, or_keep, resolve_slug};
use crate::error::{ApiError, DuplicateAs};
use crate::models::{Article, ArticleStatus, Category, User};
use crate::pagination::PageRequest;
use crate::store::{ArticleQuery, ArticleSort, ContentStore};

const DUPLICATE_SLUG: &str = "An article with this slug already exists";

// =============================================================================
// VIEWS
// =============================================================================

/// Author fields exposed alongside content.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub bio: String,
}

impl From<&User> for AuthorSummary {
    fn from(user: &User) -> Self {
        Self { id: user.id, name: user.name.clone(), bio: user.bio.clone() }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self { id: category.id, name: category.name.clone(), slug: category.slug.clone() }
    }
}

/// Article with its author and category populated.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleView {
    #[serde(flatten)]
    pub article: Article,
    pub author: Option<AuthorSummary>,
    pub category: Option<CategorySummary>,
}

#[derive(Debug, Serialize)]
pub struct ArticlePage {
    pub articles: Vec<ArticleView>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
}

/// Attach author and category summaries with one batched lookup each.
pub(crate) async fn populate(store: &dyn ContentStore, articles: Vec<Article>) -> Result<Vec<ArticleView>, ApiError> {
    let mut author_ids: Vec<Uuid> = articles.iter().filter_map(|a| a.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let mut category_ids: Vec<Uuid> = articles.iter().filter_map(|a| a.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();

    let authors: HashMap<Uuid, AuthorSummary> = store
        .users_by_ids(&author_ids)
        .await?
        .iter()
        .map(|u| (u.id, AuthorSummary::from(u)))
        .collect();
    let categories: HashMap<Uuid, CategorySummary> = store
        .categories_by_ids(&category_ids)
        .await?
        .iter()
        .map(|c| (c.id, CategorySummary::from(c)))
        .collect();

    Ok(articles
        .into_iter()
        .map(|article| ArticleView {
            author: article.author_id.and_then(|id| authors.get(&id).cloned()),
            category: article.category_id.and_then(|id| categories.get(&id).cloned()),
            article,
        })
        .collect())
}

async fn populate_one(store: &dyn ContentStore, article: Article) -> Result<ArticleView, ApiError> {
    let mut views = populate(store, vec![article]).await?;
    views
        .pop()
        .ok_or_else(|| ApiError::internal("populate dropped an article"))
}

// =============================================================================
// INPUT
// =============================================================================

/// Create/update body. Every field is optional on the wire; `create`
/// enforces the required ones.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    /// Category id or slug.
    pub category: Option<String>,
    pub status: Option<String>,
    pub tags: Option<TagsInput>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<ArticleStatus>, ApiError> {
    non_blank(raw)
        .map(|s| ArticleStatus::parse(s).ok_or_else(|| ApiError::Validation(format!("Invalid status: {s}"))))
        .transpose()
}

/// Resolve a category reference given as id or slug.
pub(crate) async fn resolve_category(store: &dyn ContentStore, raw: &str) -> Result<Option<Category>, ApiError> {
    let raw = raw.trim();
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(store.find_category(id).await?);
    }
    Ok(store.find_category_by_slug(raw).await?)
}

async fn require_category(store: &dyn ContentStore, raw: &str) -> Result<Uuid, ApiError> {
    resolve_category(store, raw)
        .await?
        .map(|c| c.id)
        .ok_or_else(|| ApiError::Validation(format!("Unknown category: {}", raw.trim())))
}

// =============================================================================
// WRITES
// =============================================================================

pub async fn create_article(
    store: &dyn ContentStore,
    author: &User,
    input: ArticleInput,
) -> Result<ArticleView, ApiError> {
    let title = non_blank(input.title.as_deref())
        .ok_or_else(|| ApiError::Validation("Title is required".to_owned()))?
        .to_owned();
    let content = input
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Content is required".to_owned()))?;
    let status = parse_status(input.status.as_deref())?.unwrap_or(ArticleStatus::Draft);
    let category_id = match non_blank(input.category.as_deref()) {
        Some(raw) => Some(require_category(store, raw).await?),
        None => None,
    };

    let id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    let excerpt = match non_blank(input.excerpt.as_deref()) {
        Some(excerpt) => excerpt.to_owned(),
        None => excerpt_from_html(&content),
    };
    let article = Article {
        id,
        slug: resolve_slug(input.slug.as_deref(), &title, "article", id),
        title,
        excerpt,
        content,
        featured_image: input.featured_image.unwrap_or_default(),
        category_id,
        author_id: Some(author.id),
        status,
        views: 0,
        tags: input.tags.map(TagsInput::into_tags).unwrap_or_default(),
        published_at: (status == ArticleStatus::Published).then_some(now),
        created_at: now,
        updated_at: now,
    };
    store.insert_article(&article).await.duplicate_as(DUPLICATE_SLUG)?;
    tracing::info!(article_id = %article.id, slug = %article.slug, "article created");
    populate_one(store, article).await
}

pub async fn update_article(store: &dyn ContentStore, id: Uuid, input: ArticleInput) -> Result<ArticleView, ApiError> {
    let mut article = store
        .find_article(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Article"))?;

    let status = parse_status(input.status.as_deref())?;
    let category_id = match non_blank(input.category.as_deref()) {
        Some(raw) => Some(require_category(store, raw).await?),
        None => article.category_id,
    };

    let new_title = non_blank(input.title.as_deref()).map(str::to_owned);
    let title_changed = new_title.as_ref().is_some_and(|t| *t != article.title);
    article.title = or_keep(new_title, article.title);
    if non_blank(input.slug.as_deref()).is_some() || title_changed {
        article.slug = resolve_slug(input.slug.as_deref(), &article.title, "article", article.id);
    }

    let content_changed = input
        .content
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty() && c != article.content);
    article.content = or_keep(input.content, article.content);
    article.excerpt = or_keep(input.excerpt, article.excerpt);
    if content_changed && article.excerpt.trim().is_empty() {
        article.excerpt = excerpt_from_html(&article.content);
    }

    article.featured_image = or_keep(input.featured_image, article.featured_image);
    article.category_id = category_id;
    if let Some(status) = status {
        article.status = status;
    }
    match input.tags {
        Some(TagsInput::Csv(csv)) if csv.trim().is_empty() => {}
        Some(tags) => article.tags = tags.into_tags(),
        None => {}
    }

    let now = OffsetDateTime::now_utc();
    if article.status == ArticleStatus::Published && article.published_at.is_none() {
        article.published_at = Some(now);
    }
    article.updated_at = now;

    store.update_article(&article).await.duplicate_as(DUPLICATE_SLUG)?;
    // Re-read so the response carries the live view counter.
    let stored = store.find_article(id).await?.unwrap_or(article);
    populate_one(store, stored).await
}

pub async fn delete_article(store: &dyn ContentStore, id: Uuid) -> Result<(), ApiError> {
    if store.delete_article(id).await? {
        tracing::info!(article_id = %id, "article deleted");
        Ok(())
    } else {
        Err(ApiError::not_found("Article"))
    }
}

// =============================================================================
// READS
// =============================================================================

/// Query string of the public listing.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

/// Published articles, filtered, sorted and paginated.
pub async fn list_published(store: &dyn ContentStore, params: ArticleListParams) -> Result<ArticlePage, ApiError> {
    let page = PageRequest::from_params(params.page, params.limit);
    let category_id = match non_blank(params.category.as_deref()) {
        Some(raw) => match resolve_category(store, raw).await? {
            Some(category) => Some(category.id),
            None => return Ok(ArticlePage { articles: Vec::new(), page: page.page, pages: 0, total: 0 }),
        },
        None => None,
    };
    let sort = match params.sort.as_deref() {
        Some("-views") => ArticleSort::MostViewed,
        _ => ArticleSort::Newest,
    };

    let query = ArticleQuery {
        status: Some(ArticleStatus::Published),
        category_id,
        search: params.search,
        sort,
        page: Some(page),
    };
    let (articles, total) = store.list_articles(&query).await?;
    Ok(ArticlePage {
        articles: populate(store, articles).await?,
        page: page.page,
        pages: page.page_count(total),
        total,
    })
}

/// Every article regardless of status, newest first.
pub async fn list_all(store: &dyn ContentStore) -> Result<Vec<ArticleView>, ApiError> {
    let query = ArticleQuery { sort: ArticleSort::Created, ..ArticleQuery::default() };
    let (articles, _) = store.list_articles(&query).await?;
    populate(store, articles).await
}

/// Public read by slug. Counts the view atomically.
pub async fn read_published(store: &dyn ContentStore, slug: &str) -> Result<ArticleView, ApiError> {
    let article = store
        .record_article_view(slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Article"))?;
    populate_one(store, article).await
}

#[cfg(test)]
#[path = "articles_test.rs"]
mod tests;
