mod config;
mod db;
mod error;
mod models;
mod pagination;
mod rate_limit;
mod routes;
mod services;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use config::AppConfig;
use rate_limit::RateLimiter;
use services::auth::AuthSettings;
use store::{ContentStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env().expect("invalid configuration");
    error::expose_internal_details(!config.production);

    let store: Arc<dyn ContentStore> = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .expect("database init failed");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };
    let storage = services::storage::from_config(&config.storage).expect("storage init failed");

    if config.seed_demo_data {
        services::seed::seed_demo_data(store.as_ref(), config.bcrypt_cost)
            .await
            .expect("demo seed failed");
    }

    let state = state::AppState::new(
        store,
        storage,
        RateLimiter::new(config.upload_rate_limit, Duration::from_secs(config.upload_rate_window_secs)),
        AuthSettings {
            session_ttl: time::Duration::hours(config.session_ttl_hours),
            bcrypt_cost: config.bcrypt_cost,
        },
    );

    let app = routes::app(state, &routes::StaticAssets::from_config(&config));
    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, production = config.production, "chess news api listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
