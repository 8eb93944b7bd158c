//! Typed server configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Parsing goes through [`AppConfig::from_lookup`] so tests can feed a plain
//! map instead of mutating the process environment. Malformed numeric
//! values fall back to their defaults; an unknown storage backend or an
//! incomplete R2 configuration is a hard error.

use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 720;
pub const DEFAULT_MEDIA_DIR: &str = "./media";
pub const DEFAULT_PUBLIC_MEDIA_URL: &str = "/media";
pub const DEFAULT_UPLOAD_RATE_LIMIT: usize = 10;
pub const DEFAULT_UPLOAD_RATE_WINDOW_SECS: u64 = 600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("unknown STORAGE_BACKEND: {0} (expected 'local' or 's3')")]
    UnknownStorageBackend(String),
}

/// Cloudflare R2 (S3-compatible) bucket settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct R2Config {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub public_url: String,
}

impl R2Config {
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Files written under `dir` and served from `public_url`.
    Local { dir: PathBuf, public_url: String },
    S3(R2Config),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// `None` selects the in-process memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub production: bool,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub static_dir: Option<PathBuf>,
    pub storage: StorageConfig,
    pub upload_rate_limit: usize,
    pub upload_rate_window_secs: u64,
    pub seed_demo_data: bool,
}

impl AppConfig {
    /// Build from the process environment.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `STORAGE_BACKEND` or when the `s3`
    /// backend is selected without every `R2_*` variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let storage = match get("STORAGE_BACKEND").as_deref().unwrap_or("local") {
            "local" => StorageConfig::Local {
                dir: PathBuf::from(get("MEDIA_DIR").unwrap_or_else(|| DEFAULT_MEDIA_DIR.to_owned())),
                public_url: get("PUBLIC_MEDIA_URL")
                    .unwrap_or_else(|| DEFAULT_PUBLIC_MEDIA_URL.to_owned())
                    .trim_end_matches('/')
                    .to_owned(),
            },
            "s3" | "r2" => {
                let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
                StorageConfig::S3(R2Config {
                    account_id: require("R2_ACCOUNT_ID")?,
                    access_key_id: require("R2_ACCESS_KEY_ID")?,
                    secret_access_key: require("R2_SECRET_ACCESS_KEY")?,
                    bucket: require("R2_BUCKET_NAME")?,
                    public_url: require("R2_PUBLIC_URL")?.trim_end_matches('/').to_owned(),
                })
            }
            other => return Err(ConfigError::UnknownStorageBackend(other.to_owned())),
        };

        Ok(Self {
            port: parse_or(get("PORT"), DEFAULT_PORT),
            database_url: get("DATABASE_URL"),
            db_max_connections: parse_or(get("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS),
            production: get("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production")),
            session_ttl_hours: parse_or(get("SESSION_TTL_HOURS"), DEFAULT_SESSION_TTL_HOURS).max(1),
            bcrypt_cost: parse_or(get("BCRYPT_COST"), bcrypt::DEFAULT_COST),
            static_dir: get("STATIC_DIR").map(PathBuf::from),
            storage,
            upload_rate_limit: parse_or(get("UPLOAD_RATE_LIMIT"), DEFAULT_UPLOAD_RATE_LIMIT),
            upload_rate_window_secs: parse_or(get("UPLOAD_RATE_WINDOW_SECS"), DEFAULT_UPLOAD_RATE_WINDOW_SECS),
            seed_demo_data: get("SEED_DEMO_DATA").and_then(|v| parse_bool(&v)).unwrap_or(false),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
