//! Object storage for uploaded media.
//!
//! ARCHITECTURE
//! ============
//! The upload route hands processed bytes to `dyn ObjectStorage` and gets a
//! public URL back. `LocalStorage` writes below a directory that the router
//! serves statically; `S3Storage` (feature `s3`) puts objects into a
//! Cloudflare R2 bucket through the S3 API.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("object store request failed: {0}")]
    Remote(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` and return the public URL of the object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
}

/// Build the configured backend.
///
/// # Errors
///
/// Returns [`StorageError::Unavailable`] when R2 storage is configured but
/// the binary was built without the `s3` feature.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>, StorageError> {
    match config {
        StorageConfig::Local { dir, public_url } => Ok(Arc::new(LocalStorage::new(dir.clone(), public_url.clone()))),
        #[cfg(feature = "s3")]
        StorageConfig::S3(r2) => Ok(Arc::new(S3Storage::new(r2))),
        #[cfg(not(feature = "s3"))]
        StorageConfig::S3(_) => Err(StorageError::Unavailable("built without the `s3` feature".to_owned())),
    }
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

// =============================================================================
// LOCAL DIRECTORY
// =============================================================================

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self { root: root.into(), public_base: public_base.into() }
    }

    /// Map a key to a path under the root, refusing anything that could
    /// escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !is_plain {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(public_url(&self.public_base, key))
    }
}

// =============================================================================
// S3 / R2
// =============================================================================

#[cfg(feature = "s3")]
pub use s3::S3Storage;

#[cfg(feature = "s3")]
mod s3 {
    use aws_config::Region;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials};
    use aws_sdk_s3::primitives::ByteStream;

    use super::{ObjectStorage, StorageError, async_trait, public_url};
    use crate::config::R2Config;

    pub struct S3Storage {
        client: aws_sdk_s3::Client,
        bucket: String,
        public_base: String,
    }

    impl S3Storage {
        #[must_use]
        pub fn new(config: &R2Config) -> Self {
            let credentials = Credentials::new(
                config.access_key_id.clone(),
                config.secret_access_key.clone(),
                None,
                None,
                "r2",
            );
            let s3_config = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("auto"))
                .endpoint_url(config.endpoint())
                .credentials_provider(credentials)
                .build();
            Self {
                client: aws_sdk_s3::Client::from_conf(s3_config),
                bucket: config.bucket.clone(),
                public_base: config.public_url.clone(),
            }
        }
    }

    #[async_trait]
    impl ObjectStorage for S3Storage {
        async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(ByteStream::from(bytes))
                .content_type(content_type)
                .send()
                .await
                .map_err(|e| StorageError::Remote(e.to_string()))?;
            Ok(public_url(&self.public_base, key))
        }
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
