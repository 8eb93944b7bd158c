use super::*;
use crate::models::{Role, TournamentStatus};
use crate::pagination::PageRequest;
use crate::state::test_helpers::{fixture_article, fixture_category, fixture_tournament, fixture_user};
use time::Duration;

// =============================================================================
// uniqueness
// =============================================================================

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let store = MemoryStore::new();
    store
        .insert_user(&fixture_user("jane@x.com", Role::User))
        .await
        .unwrap();
    let err = store
        .insert_user(&fixture_user("jane@x.com", Role::Editor))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(field) if field == "email"));
}

#[tokio::test]
async fn duplicate_category_name_is_rejected() {
    let store = MemoryStore::new();
    store
        .insert_category(&fixture_category("Strategy"))
        .await
        .unwrap();
    let err = store
        .insert_category(&fixture_category("Strategy"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[tokio::test]
async fn category_update_may_keep_its_own_slug() {
    let store = MemoryStore::new();
    let mut category = fixture_category("Strategy");
    store.insert_category(&category).await.unwrap();
    category.description = "Openings and endgames".into();
    store.update_category(&category).await.unwrap();
}

#[tokio::test]
async fn duplicate_article_slug_is_rejected_on_update() {
    let store = MemoryStore::new();
    let first = fixture_article("First", ArticleStatus::Draft);
    let mut second = fixture_article("Second", ArticleStatus::Draft);
    store.insert_article(&first).await.unwrap();
    store.insert_article(&second).await.unwrap();
    second.slug = first.slug.clone();
    assert!(matches!(store.update_article(&second).await, Err(StoreError::Duplicate(_))));
}

#[tokio::test]
async fn update_of_missing_record_is_not_found() {
    let store = MemoryStore::new();
    let article = fixture_article("Ghost", ArticleStatus::Draft);
    assert!(matches!(store.update_article(&article).await, Err(StoreError::NotFound)));
}

// =============================================================================
// view counter
// =============================================================================

#[tokio::test]
async fn record_view_increments_published_article() {
    let store = MemoryStore::new();
    let article = fixture_article("Opening Theory", ArticleStatus::Published);
    store.insert_article(&article).await.unwrap();

    for _ in 0..3 {
        store.record_article_view(&article.slug).await.unwrap();
    }
    let stored = store.find_article(article.id).await.unwrap().unwrap();
    assert_eq!(stored.views, 3);
}

#[tokio::test]
async fn record_view_ignores_drafts() {
    let store = MemoryStore::new();
    let article = fixture_article("Secret Draft", ArticleStatus::Draft);
    store.insert_article(&article).await.unwrap();
    assert!(store.record_article_view(&article.slug).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_views_are_not_lost() {
    let store = std::sync::Arc::new(MemoryStore::new());
    let article = fixture_article("Hot Take", ArticleStatus::Published);
    store.insert_article(&article).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = store.clone();
        let slug = article.slug.clone();
        handles.push(tokio::spawn(async move { store.record_article_view(&slug).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(store.find_article(article.id).await.unwrap().unwrap().views, 50);
}

#[tokio::test]
async fn update_does_not_roll_back_views() {
    let store = MemoryStore::new();
    let article = fixture_article("Endgame Study", ArticleStatus::Published);
    store.insert_article(&article).await.unwrap();
    store.record_article_view(&article.slug).await.unwrap();

    // `article` still carries views = 0.
    store.update_article(&article).await.unwrap();
    assert_eq!(store.find_article(article.id).await.unwrap().unwrap().views, 1);
}

// =============================================================================
// listing
// =============================================================================

#[tokio::test]
async fn list_articles_filters_status_and_search() {
    let store = MemoryStore::new();
    store
        .insert_article(&fixture_article("Carlsen wins again", ArticleStatus::Published))
        .await
        .unwrap();
    store
        .insert_article(&fixture_article("Carlsen draft notes", ArticleStatus::Draft))
        .await
        .unwrap();
    store
        .insert_article(&fixture_article("Sicilian primer", ArticleStatus::Published))
        .await
        .unwrap();

    let query = ArticleQuery {
        status: Some(ArticleStatus::Published),
        search: Some("CARLSEN".into()),
        ..ArticleQuery::default()
    };
    let (articles, total) = store.list_articles(&query).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(articles[0].title, "Carlsen wins again");
}

#[tokio::test]
async fn list_articles_search_matches_excerpt() {
    let store = MemoryStore::new();
    let mut article = fixture_article("Weekly roundup", ArticleStatus::Published);
    article.excerpt = "Highlights from the Tata Steel event".into();
    store.insert_article(&article).await.unwrap();

    let query = ArticleQuery { search: Some("tata steel".into()), ..ArticleQuery::default() };
    assert_eq!(store.list_articles(&query).await.unwrap().1, 1);
}

#[tokio::test]
async fn list_articles_sorts_by_views() {
    let store = MemoryStore::new();
    let mut low = fixture_article("Low", ArticleStatus::Published);
    low.views = 1;
    let mut high = fixture_article("High", ArticleStatus::Published);
    high.views = 99;
    store.insert_article(&low).await.unwrap();
    store.insert_article(&high).await.unwrap();

    let query = ArticleQuery { sort: ArticleSort::MostViewed, ..ArticleQuery::default() };
    let (articles, _) = store.list_articles(&query).await.unwrap();
    assert_eq!(articles[0].title, "High");
}

#[tokio::test]
async fn list_articles_paginates_with_full_total() {
    let store = MemoryStore::new();
    for i in 0..25 {
        store
            .insert_article(&fixture_article(&format!("Story {i}"), ArticleStatus::Published))
            .await
            .unwrap();
    }
    let query = ArticleQuery {
        page: Some(PageRequest::from_params(Some(3), Some(10))),
        ..ArticleQuery::default()
    };
    let (articles, total) = store.list_articles(&query).await.unwrap();
    assert_eq!(total, 25);
    assert_eq!(articles.len(), 5);
}

#[tokio::test]
async fn list_tournaments_filters_and_sorts() {
    let store = MemoryStore::new();
    let now = OffsetDateTime::now_utc();
    store
        .insert_tournament(&fixture_tournament("Later Open", now + Duration::days(20), TournamentStatus::Upcoming))
        .await
        .unwrap();
    store
        .insert_tournament(&fixture_tournament("Sooner Open", now + Duration::days(2), TournamentStatus::Upcoming))
        .await
        .unwrap();
    store
        .insert_tournament(&fixture_tournament("Old Cup", now - Duration::days(40), TournamentStatus::Completed))
        .await
        .unwrap();

    let query = TournamentQuery { status: Some(TournamentStatus::Upcoming), ..TournamentQuery::default() };
    let (upcoming, total) = store.list_tournaments(&query).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(upcoming[0].title, "Sooner Open");

    let query = TournamentQuery { sort: TournamentSort::DateDesc, ..TournamentQuery::default() };
    let (all, _) = store.list_tournaments(&query).await.unwrap();
    assert_eq!(all[0].title, "Later Open");
    assert_eq!(all[2].title, "Old Cup");
}

#[tokio::test]
async fn title_sort_ignores_case() {
    let store = MemoryStore::new();
    let date = OffsetDateTime::now_utc() + Duration::days(5);
    for title in ["Zurich Open", "amateur cup", "Berlin Blitz"] {
        store
            .insert_tournament(&fixture_tournament(title, date, TournamentStatus::Upcoming))
            .await
            .unwrap();
    }

    let query = TournamentQuery { sort: TournamentSort::Title, ..TournamentQuery::default() };
    let (sorted, _) = store.list_tournaments(&query).await.unwrap();
    let titles: Vec<_> = sorted.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["amateur cup", "Berlin Blitz", "Zurich Open"]);

    let (same_day, _) = store.list_tournaments(&TournamentQuery::default()).await.unwrap();
    assert_eq!(same_day[0].title, "amateur cup");
}

#[tokio::test]
async fn list_tournaments_search_matches_location() {
    let store = MemoryStore::new();
    let mut tournament =
        fixture_tournament("Spring Open", OffsetDateTime::now_utc(), TournamentStatus::Ongoing);
    tournament.location = "Wijk aan Zee".into();
    store.insert_tournament(&tournament).await.unwrap();

    let query = TournamentQuery { search: Some("wijk".into()), ..TournamentQuery::default() };
    assert_eq!(store.list_tournaments(&query).await.unwrap().1, 1);
}

// =============================================================================
// cascades and aggregates
// =============================================================================

#[tokio::test]
async fn deleting_category_clears_article_reference() {
    let store = MemoryStore::new();
    let category = fixture_category("News");
    let mut article = fixture_article("Linked", ArticleStatus::Published);
    article.category_id = Some(category.id);
    store.insert_category(&category).await.unwrap();
    store.insert_article(&article).await.unwrap();

    assert!(store.delete_category(category.id).await.unwrap());
    let stored = store.find_article(article.id).await.unwrap().unwrap();
    assert!(stored.category_id.is_none());
}

#[tokio::test]
async fn deleting_user_clears_authorship_and_sessions() {
    let store = MemoryStore::new();
    let user = fixture_user("author@x.com", Role::Editor);
    let mut article = fixture_article("Authored", ArticleStatus::Draft);
    article.author_id = Some(user.id);
    store.insert_user(&user).await.unwrap();
    store.insert_article(&article).await.unwrap();
    let now = OffsetDateTime::now_utc();
    store
        .insert_session(&Session { token_hash: "h".into(), user_id: user.id, expires_at: now + Duration::hours(1) })
        .await
        .unwrap();

    assert!(store.delete_user(user.id).await.unwrap());
    assert!(store.find_article(article.id).await.unwrap().unwrap().author_id.is_none());
    assert!(store.find_session("h", now).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_session_is_not_found() {
    let store = MemoryStore::new();
    let now = OffsetDateTime::now_utc();
    store
        .insert_session(&Session { token_hash: "old".into(), user_id: Uuid::new_v4(), expires_at: now - Duration::seconds(1) })
        .await
        .unwrap();
    assert!(store.find_session("old", now).await.unwrap().is_none());
}

#[tokio::test]
async fn published_counts_skip_drafts() {
    let store = MemoryStore::new();
    let category = fixture_category("Interviews");
    store.insert_category(&category).await.unwrap();
    for (title, status) in [
        ("One", ArticleStatus::Published),
        ("Two", ArticleStatus::Published),
        ("Three", ArticleStatus::Draft),
    ] {
        let mut article = fixture_article(title, status);
        article.category_id = Some(category.id);
        store.insert_article(&article).await.unwrap();
    }
    let counts = store.published_counts_by_category().await.unwrap();
    assert_eq!(counts.get(&category.id), Some(&2));
}

#[tokio::test]
async fn total_views_is_zero_when_empty() {
    let store = MemoryStore::new();
    assert_eq!(store.total_article_views().await.unwrap(), 0);
}
