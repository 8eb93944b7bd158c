use super::*;
use crate::models::{ArticleStatus, Role};
use crate::state::test_helpers::{fixture_article, seed_user, test_app_state};

fn body(title: &str, status: &str) -> ArticleInput {
    ArticleInput {
        title: Some(title.into()),
        content: Some("<p>Report</p>".into()),
        status: Some(status.into()),
        ..ArticleInput::default()
    }
}

#[tokio::test]
async fn create_returns_created_and_public_read_counts_views() {
    let state = test_app_state();
    let (editor, _) = seed_user(&state, Role::Editor).await;

    let (status, Json(view)) = create(State(state.clone()), EditorUser(editor), JsonBody(body("Round One", "published")))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view.article.slug, "round-one");

    let Json(read) = get_by_slug(State(state.clone()), Path("round-one".into())).await.unwrap();
    assert_eq!(read.article.views, 1);
}

#[tokio::test]
async fn public_list_hides_drafts_but_admin_list_shows_them() {
    let state = test_app_state();
    let (editor, _) = seed_user(&state, Role::Editor).await;
    state
        .store
        .insert_article(&fixture_article("Visible", ArticleStatus::Published))
        .await
        .unwrap();
    state
        .store
        .insert_article(&fixture_article("Hidden", ArticleStatus::Draft))
        .await
        .unwrap();

    let Json(page) = list(State(state.clone()), QueryParams(ArticleListParams::default())).await.unwrap();
    assert_eq!(page.total, 1);

    let Json(all) = list_admin(State(state), EditorUser(editor)).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn update_and_delete_by_id() {
    let state = test_app_state();
    let (editor, _) = seed_user(&state, Role::Editor).await;
    let article = fixture_article("Draft Copy", ArticleStatus::Draft);
    state.store.insert_article(&article).await.unwrap();

    let patch = ArticleInput { status: Some("published".into()), ..ArticleInput::default() };
    let Json(view) = update(State(state.clone()), EditorUser(editor.clone()), Path(article.id.to_string()), JsonBody(patch))
        .await
        .unwrap();
    assert_eq!(view.article.status, ArticleStatus::Published);

    let Json(msg) = delete(State(state.clone()), EditorUser(editor), Path(article.id.to_string()))
        .await
        .unwrap();
    assert_eq!(msg.message, "Article deleted");
}

#[tokio::test]
async fn malformed_id_is_not_found() {
    let state = test_app_state();
    let (editor, _) = seed_user(&state, Role::Editor).await;
    let err = delete(State(state), EditorUser(editor), Path("not-a-uuid".into()))
        .await
        .unwrap_err();
    assert!(matches!(&err, ApiError::NotFound(msg) if msg == "Article not found"));
}
