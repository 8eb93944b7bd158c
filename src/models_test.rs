use super::*;

// =============================================================================
// Role ordering
// =============================================================================

#[test]
fn role_order_is_user_editor_admin() {
    assert!(Role::User < Role::Editor);
    assert!(Role::Editor < Role::Admin);
}

#[test]
fn admin_allows_every_level() {
    assert!(Role::Admin.allows(Role::Admin));
    assert!(Role::Admin.allows(Role::Editor));
    assert!(Role::Admin.allows(Role::User));
}

#[test]
fn editor_allows_editor_but_not_admin() {
    assert!(Role::Editor.allows(Role::Editor));
    assert!(Role::Editor.allows(Role::User));
    assert!(!Role::Editor.allows(Role::Admin));
}

#[test]
fn user_allows_only_user() {
    assert!(Role::User.allows(Role::User));
    assert!(!Role::User.allows(Role::Editor));
    assert!(!Role::User.allows(Role::Admin));
}

#[test]
fn role_parse_is_case_insensitive() {
    assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
    assert_eq!(Role::parse(" editor "), Some(Role::Editor));
    assert_eq!(Role::parse("superuser"), None);
}

// =============================================================================
// Enumerated columns
// =============================================================================

#[test]
fn article_status_round_trips_through_text() {
    for status in [ArticleStatus::Draft, ArticleStatus::Published] {
        assert_eq!(ArticleStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(ArticleStatus::parse("archived"), None);
}

#[test]
fn tournament_status_round_trips_through_text() {
    for status in [
        TournamentStatus::Upcoming,
        TournamentStatus::Ongoing,
        TournamentStatus::Completed,
        TournamentStatus::Cancelled,
    ] {
        assert_eq!(TournamentStatus::parse(status.as_str()), Some(status));
    }
}

#[test]
fn tournament_format_parses_display_labels() {
    assert_eq!(TournamentFormat::parse("Round Robin"), Some(TournamentFormat::RoundRobin));
    assert_eq!(TournamentFormat::parse("round robin"), Some(TournamentFormat::RoundRobin));
    assert_eq!(TournamentFormat::parse("Swiss"), Some(TournamentFormat::Swiss));
    assert_eq!(TournamentFormat::parse("Bullet"), None);
}

#[test]
fn tournament_format_serializes_label() {
    let json = serde_json::to_string(&TournamentFormat::RoundRobin).unwrap();
    assert_eq!(json, "\"Round Robin\"");
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn user_serialization_hides_password_hash() {
    let now = OffsetDateTime::now_utc();
    let user = User {
        id: Uuid::nil(),
        name: "Jane".into(),
        email: "jane@x.com".into(),
        password_hash: "$2b$04$secret".into(),
        role: Role::Editor,
        is_active: true,
        bio: String::new(),
        created_at: now,
        updated_at: now,
    };
    let value = serde_json::to_value(&user).unwrap();
    assert!(value.get("passwordHash").is_none());
    assert!(value.get("password_hash").is_none());
    assert_eq!(value["role"], "editor");
    assert_eq!(value["isActive"], true);
}

#[test]
fn article_serializes_camel_case_and_null_publish_time() {
    let now = OffsetDateTime::now_utc();
    let article = Article {
        id: Uuid::nil(),
        title: "t".into(),
        slug: "t".into(),
        content: "c".into(),
        excerpt: "c".into(),
        featured_image: String::new(),
        category_id: None,
        author_id: None,
        status: ArticleStatus::Draft,
        views: 0,
        tags: vec![],
        published_at: None,
        created_at: now,
        updated_at: now,
    };
    let value = serde_json::to_value(&article).unwrap();
    assert!(value["publishedAt"].is_null());
    assert_eq!(value["featuredImage"], "");
    assert_eq!(value["status"], "draft");
}
