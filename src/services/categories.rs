//! Category CRUD and the public listing with per-category article counts.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::text::{non_blank, or_keep, resolve_slug};
use crate::error::{ApiError, DuplicateAs};
use crate::models::Category;
use crate::store::ContentStore;

const DUPLICATE_CATEGORY: &str = "Category already exists";

/// Category plus the number of published articles filed under it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub article_count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// All categories by name, each with its published-article count.
pub async fn list_categories(store: &dyn ContentStore) -> Result<Vec<CategoryWithCount>, ApiError> {
    let (categories, counts) = tokio::try_join!(store.list_categories(), store.published_counts_by_category())?;
    Ok(categories
        .into_iter()
        .map(|category| CategoryWithCount {
            article_count: counts.get(&category.id).copied().unwrap_or(0),
            category,
        })
        .collect())
}

pub async fn get_category(store: &dyn ContentStore, slug: &str) -> Result<Category, ApiError> {
    store
        .find_category_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))
}

pub async fn create_category(store: &dyn ContentStore, input: CategoryInput) -> Result<Category, ApiError> {
    let name = non_blank(input.name.as_deref())
        .ok_or_else(|| ApiError::Validation("Name is required".to_owned()))?
        .to_owned();
    let id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc();
    let category = Category {
        id,
        slug: resolve_slug(input.slug.as_deref(), &name, "category", id),
        name,
        description: input.description.unwrap_or_default(),
        image: input.image.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };
    store.insert_category(&category).await.duplicate_as(DUPLICATE_CATEGORY)?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
    Ok(category)
}

pub async fn update_category(store: &dyn ContentStore, id: Uuid, input: CategoryInput) -> Result<Category, ApiError> {
    let mut category = store
        .find_category(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category"))?;

    let new_name = non_blank(input.name.as_deref()).map(str::to_owned);
    let name_changed = new_name.as_ref().is_some_and(|n| *n != category.name);
    category.name = or_keep(new_name, category.name);
    if non_blank(input.slug.as_deref()).is_some() || name_changed {
        category.slug = resolve_slug(input.slug.as_deref(), &category.name, "category", category.id);
    }
    category.description = or_keep(input.description, category.description);
    category.image = or_keep(input.image, category.image);
    category.updated_at = OffsetDateTime::now_utc();

    store.update_category(&category).await.duplicate_as(DUPLICATE_CATEGORY)?;
    Ok(category)
}

/// Delete a category. Articles filed under it become uncategorized.
pub async fn delete_category(store: &dyn ContentStore, id: Uuid) -> Result<(), ApiError> {
    if store.delete_category(id).await? {
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    } else {
        Err(ApiError::not_found("Category"))
    }
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;
