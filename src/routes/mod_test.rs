use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use image::{ImageBuffer, ImageFormat, Rgb};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use super::*;
use crate::models::Role;
use crate::rate_limit::RateLimiter;
use crate::services::storage::LocalStorage;
use crate::state::test_helpers::{RecordingStorage, seed_user, test_app_state, test_auth_settings};
use crate::store::MemoryStore;

/// Serve the router on an ephemeral port and return its base URL.
async fn spawn_app(state: AppState, assets: StaticAssets) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app(state, &assets);
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgb([10, 20, 30]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
}

fn image_form(bytes: Vec<u8>, mime: &str) -> Form {
    Form::new().part("image", Part::bytes(bytes).file_name("board.png").mime_str(mime).unwrap())
}

// =============================================================================
// basics
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let base = spawn_app(test_app_state(), StaticAssets::default()).await;
    let body: Value = reqwest::get(format!("{base}/api/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Chess News API is running");
}

#[tokio::test]
async fn unknown_api_route_is_json_404() {
    let base = spawn_app(test_app_state(), StaticAssets::default()).await;
    for path in ["/api/nope", "/api/articles/x/comments", "/elsewhere"] {
        let resp = reqwest::get(format!("{base}{path}")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Route not found");
    }
}

#[tokio::test]
async fn spa_fallback_serves_index_but_not_for_api() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>hub</html>").unwrap();
    let assets = StaticAssets { spa_dir: Some(dir.path().to_path_buf()), media: None };
    let base = spawn_app(test_app_state(), assets).await;

    let page = reqwest::get(format!("{base}/articles/some-slug")).await.unwrap();
    assert!(page.status().is_success());
    assert_eq!(page.text().await.unwrap(), "<html>hub</html>");

    let api = reqwest::get(format!("{base}/api/missing")).await.unwrap();
    assert_eq!(api.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_route_without_token_is_401_json() {
    let base = spawn_app(test_app_state(), StaticAssets::default()).await;
    let resp = reqwest::get(format!("{base}/api/auth/me")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Not authorized, no token");
}

#[tokio::test]
async fn malformed_bodies_and_queries_are_400_json() {
    let state = test_app_state();
    let (_, token) = seed_user(&state, Role::Editor).await;
    let base = spawn_app(state, StaticAssets::default()).await;
    let client = reqwest::Client::new();

    let bodies = [
        ("/api/tournaments", "{not json"),
        ("/api/tournaments", r#"{"participants":"abc"}"#),
        ("/api/articles", r#"{"tags":5}"#),
    ];
    for (path, raw) in bodies {
        let resp = client
            .post(format!("{base}{path}"))
            .bearer_auth(&token)
            .header("content-type", "application/json")
            .body(raw)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST, "{path} {raw}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].is_string(), "{raw}");
    }

    let missing_type = client
        .post(format!("{base}/api/auth/login"))
        .body(r#"{"email":"a@b.c","password":"secret1"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(missing_type.status(), reqwest::StatusCode::BAD_REQUEST);

    for path in ["/api/articles?page=abc", "/api/tournaments?limit=ten"] {
        let resp = reqwest::get(format!("{base}{path}")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["message"].is_string(), "{path}");
    }
}

// =============================================================================
// publishing scenario
// =============================================================================

#[tokio::test]
async fn reader_is_forbidden_until_promoted_to_editor() {
    let state = test_app_state();
    let (_, admin_token) = seed_user(&state, Role::Admin).await;
    let base = spawn_app(state, StaticAssets::default()).await;
    let client = reqwest::Client::new();

    let registered = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({ "name": "Jane", "email": "jane@x.com", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(registered.status(), reqwest::StatusCode::CREATED);
    let registered: Value = registered.json().await.unwrap();
    let jane_id = registered["id"].as_str().unwrap().to_owned();
    assert_eq!(registered["role"], "user");

    let login: Value = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({ "email": "jane@x.com", "password": "secret1" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_owned();

    let article = json!({ "title": "Jane's First Report", "content": "<p>1. e4</p>", "status": "published" });
    let forbidden = client
        .post(format!("{base}/api/articles"))
        .bearer_auth(&token)
        .json(&article)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), reqwest::StatusCode::FORBIDDEN);

    let promoted = client
        .put(format!("{base}/api/users/{jane_id}"))
        .bearer_auth(&admin_token)
        .json(&json!({ "role": "editor" }))
        .send()
        .await
        .unwrap();
    assert!(promoted.status().is_success());

    let created = client
        .post(format!("{base}/api/articles"))
        .bearer_auth(&token)
        .json(&article)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    let created: Value = created.json().await.unwrap();
    assert_eq!(created["slug"], "janes-first-report");
    assert_eq!(created["author"]["name"], "Jane");

    let listed: Value = reqwest::get(format!("{base}/api/articles?limit=5"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["pages"], 1);
}

// =============================================================================
// uploads
// =============================================================================

#[tokio::test]
async fn upload_stores_webp_and_rate_limits_per_ip() {
    let storage = Arc::new(RecordingStorage::default());
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        storage.clone(),
        RateLimiter::new(1, Duration::from_secs(60)),
        test_auth_settings(),
    );
    let (_, token) = seed_user(&state, Role::Editor).await;
    let base = spawn_app(state, StaticAssets::default()).await;
    let client = reqwest::Client::new();

    let first = client
        .post(format!("{base}/api/upload"))
        .bearer_auth(&token)
        .multipart(image_form(png_bytes(), "image/png"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    let body: Value = first.json().await.unwrap();
    assert!(body["url"].as_str().unwrap().ends_with(".webp"));
    assert_eq!(storage.puts.lock().unwrap().len(), 1);

    let second = client
        .post(format!("{base}/api/upload"))
        .bearer_auth(&token)
        .multipart(image_form(png_bytes(), "image/png"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["message"], "Upload too many times, slow down.");
}

#[tokio::test]
async fn upload_rejects_missing_file_and_bad_type() {
    let state = test_app_state();
    let (_, token) = seed_user(&state, Role::Editor).await;
    let base = spawn_app(state, StaticAssets::default()).await;
    let client = reqwest::Client::new();

    let missing = client
        .post(format!("{base}/api/upload"))
        .bearer_auth(&token)
        .multipart(Form::new().text("caption", "no file"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["message"], "No file uploaded");

    let svg = client
        .post(format!("{base}/api/upload"))
        .bearer_auth(&token)
        .multipart(image_form(b"<svg/>".to_vec(), "image/svg+xml"))
        .send()
        .await
        .unwrap();
    assert_eq!(svg.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn local_media_is_served_under_mount() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(dir.path(), "/media"));
    let state = AppState::new(Arc::new(MemoryStore::new()), storage, RateLimiter::default(), test_auth_settings());
    let (_, token) = seed_user(&state, Role::Admin).await;
    let assets = StaticAssets { spa_dir: None, media: Some(("/media".to_owned(), dir.path().to_path_buf())) };
    let base = spawn_app(state, assets).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{base}/api/upload"))
        .bearer_auth(&token)
        .multipart(image_form(png_bytes(), "image/png"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("/media/uploads/"), "{url}");

    let served = reqwest::get(format!("{base}{url}")).await.unwrap();
    assert!(served.status().is_success());
    let bytes = served.bytes().await.unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
}

#[test]
fn assets_mount_local_media_only() {
    let config = AppConfig::from_lookup(|key| match key {
        "STATIC_DIR" => Some("./dist".to_owned()),
        _ => None,
    })
    .unwrap();
    let assets = StaticAssets::from_config(&config);
    assert_eq!(assets.spa_dir, Some(PathBuf::from("./dist")));
    assert_eq!(assets.media, Some(("/media".to_owned(), PathBuf::from("./media"))));

    let config = AppConfig::from_lookup(|key| match key {
        "PUBLIC_MEDIA_URL" => Some("https://cdn.example.com".to_owned()),
        _ => None,
    })
    .unwrap();
    assert!(StaticAssets::from_config(&config).media.is_none());
}
