//! Demo content for a fresh install.
//!
//! Enabled with `SEED_DEMO_DATA=true`. Runs only against a store with no
//! users, so restarting never duplicates or overwrites anything.

use time::OffsetDateTime;
use uuid::Uuid;

use super::auth::hash_password;
use crate::error::ApiError;
use crate::models::{Article, ArticleStatus, Category, Role, User};
use crate::store::ContentStore;

pub const DEMO_PASSWORD: &str = "password123";

struct DemoUser {
    name: &'static str,
    email: &'static str,
    role: Role,
    bio: &'static str,
}

const USERS: [DemoUser; 3] = [
    DemoUser { name: "Admin User", email: "admin@example.com", role: Role::Admin, bio: "Chief Editor of Pawn to Glory" },
    DemoUser { name: "Editor User", email: "editor@example.com", role: Role::Editor, bio: "Senior Chess Analyst" },
    DemoUser { name: "Regular User", email: "user@example.com", role: Role::User, bio: "Chess enthusiast" },
];

const CATEGORIES: [(&str, &str, &str); 4] = [
    ("World News", "world-news", "Global chess tournaments and championships"),
    ("Strategy", "strategy", "Openings, endgames, and tactical guides"),
    ("Tournaments", "tournaments", "Coverage of major chess events"),
    ("Interviews", "interviews", "Exclusive talks with grandmasters"),
];

struct DemoArticle {
    title: &'static str,
    slug: &'static str,
    excerpt: &'static str,
    content: &'static str,
    status: ArticleStatus,
    tags: [&'static str; 3],
    views: i64,
    /// Index into [`CATEGORIES`].
    category: usize,
}

const ARTICLES: [DemoArticle; 3] = [
    DemoArticle {
        title: "Magnus Carlsen Wins Another Title",
        slug: "magnus-carlsen-wins-another-title",
        excerpt: "The world champion demonstrates his dominance once again in a thrilling finale.",
        content: "<p>Magnus Carlsen has done it again. In a stunning display of tactical brilliance, he secured the victory...</p><p>The final game was a masterclass in positional play.</p>",
        status: ArticleStatus::Published,
        tags: ["magnus", "champion", "news"],
        views: 1250,
        category: 0,
    },
    DemoArticle {
        title: "Top 10 Openings for Beginners",
        slug: "top-10-openings-beginners",
        excerpt: "Master these essential openings to improve your rating quickly.",
        content: "<p>Starting out in chess can be daunting. Here are the top 10 openings you should know...</p><ul><li>Italian Game</li><li>Ruy Lopez</li><li>Sicilian Defense</li></ul>",
        status: ArticleStatus::Published,
        tags: ["strategy", "learning", "openings"],
        views: 890,
        category: 1,
    },
    DemoArticle {
        title: "Candidates Tournament 2024 Preview",
        slug: "candidates-tournament-2024-preview",
        excerpt: "Who will challenge Ding Liren? We analyze the contenders.",
        content: "<p>The Candidates Tournament is just around the corner. Let's look at the favorites...</p>",
        status: ArticleStatus::Draft,
        tags: ["candidates", "fide", "preview"],
        views: 0,
        category: 2,
    },
];

/// Insert the demo accounts, categories and articles if the store has no
/// users. Returns whether anything was written.
pub async fn seed_demo_data(store: &dyn ContentStore, bcrypt_cost: u32) -> Result<bool, ApiError> {
    if store.count_users().await? > 0 {
        tracing::info!("store already has users; skipping demo seed");
        return Ok(false);
    }

    let now = OffsetDateTime::now_utc();
    let password_hash = hash_password(DEMO_PASSWORD.to_owned(), bcrypt_cost).await?;

    let mut admin_id = None;
    for demo in &USERS {
        let user = User {
            id: Uuid::new_v4(),
            name: demo.name.to_owned(),
            email: demo.email.to_owned(),
            password_hash: password_hash.clone(),
            role: demo.role,
            is_active: true,
            bio: demo.bio.to_owned(),
            created_at: now,
            updated_at: now,
        };
        store.insert_user(&user).await?;
        if demo.role == Role::Admin {
            admin_id = Some(user.id);
        }
    }

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, slug, description) in CATEGORIES {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            slug: slug.to_owned(),
            description: description.to_owned(),
            image: String::new(),
            created_at: now,
            updated_at: now,
        };
        store.insert_category(&category).await?;
        category_ids.push(category.id);
    }

    for demo in &ARTICLES {
        let article = Article {
            id: Uuid::new_v4(),
            title: demo.title.to_owned(),
            slug: demo.slug.to_owned(),
            content: demo.content.to_owned(),
            excerpt: demo.excerpt.to_owned(),
            featured_image: String::new(),
            category_id: category_ids.get(demo.category).copied(),
            author_id: admin_id,
            status: demo.status,
            views: demo.views,
            tags: demo.tags.iter().map(|t| (*t).to_owned()).collect(),
            published_at: (demo.status == ArticleStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };
        store.insert_article(&article).await?;
    }

    tracing::info!(
        users = USERS.len(),
        categories = CATEGORIES.len(),
        articles = ARTICLES.len(),
        "demo data seeded"
    );
    Ok(true)
}

#[cfg(test)]
#[path = "seed_test.rs"]
mod tests;
