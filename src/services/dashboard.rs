//! Admin dashboard summary: totals plus a merged recent-activity feed.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Article, User};
use crate::store::ContentStore;

/// Newest records taken from each collection before merging.
const RECENT_PER_KIND: i64 = 5;
const ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Article,
    User,
}

#[derive(Debug, Serialize)]
pub struct ActivityItem {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action: &'static str,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub details: String,
}

impl From<Article> for ActivityItem {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            kind: ActivityKind::Article,
            action: "New article",
            title: article.title,
            time: article.created_at,
            details: article.status.as_str().to_owned(),
        }
    }
}

impl From<User> for ActivityItem {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            kind: ActivityKind::User,
            action: "New user",
            title: user.email,
            time: user.created_at,
            details: user.role.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_articles: i64,
    pub total_views: i64,
    pub total_users: i64,
    pub recent_activity: Vec<ActivityItem>,
}

/// Merge recent articles and users, newest first, capped at ten entries.
fn merge_activity(articles: Vec<Article>, users: Vec<User>) -> Vec<ActivityItem> {
    let mut activity: Vec<ActivityItem> = articles
        .into_iter()
        .map(ActivityItem::from)
        .chain(users.into_iter().map(ActivityItem::from))
        .collect();
    activity.sort_by(|a, b| b.time.cmp(&a.time));
    activity.truncate(ACTIVITY_LIMIT);
    activity
}

/// Gather dashboard totals. The five store queries run concurrently.
pub async fn stats(store: &dyn ContentStore) -> Result<DashboardStats, ApiError> {
    let (total_articles, total_views, total_users, articles, users) = tokio::try_join!(
        store.count_articles(),
        store.total_article_views(),
        store.count_users(),
        store.recent_articles(RECENT_PER_KIND),
        store.recent_users(RECENT_PER_KIND),
    )?;

    Ok(DashboardStats {
        total_articles,
        total_views,
        total_users,
        recent_activity: merge_activity(articles, users),
    })
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
